use std::borrow::Cow;

const JWT_PREFIX: &str = "eyJ";

fn is_token_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.' | '=' | '+' | '/')
}

/// Replaces the credential following every `Bearer ` marker.
pub fn redact_bearer_token(input: &str) -> Cow<'_, str> {
    if !input.contains("Bearer ") {
        return Cow::Borrowed(input);
    }

    let marker = "Bearer ";
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(idx) = rest.find(marker) {
        out.push_str(&rest[..idx + marker.len()]);
        rest = &rest[idx + marker.len()..];

        let consumed: usize = rest
            .chars()
            .take_while(|ch| is_token_char(*ch))
            .map(char::len_utf8)
            .sum();
        out.push_str("REDACTED");
        rest = &rest[consumed..];
    }
    out.push_str(rest);

    if out == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(out)
    }
}

/// Masks anything shaped like a JWT (`eyJ...`), wherever it appears.
pub fn redact_jwt(input: &str) -> Cow<'_, str> {
    if !input.contains(JWT_PREFIX) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(idx) = rest.find(JWT_PREFIX) {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];
        let consumed: usize = rest
            .chars()
            .take_while(|ch| is_token_char(*ch))
            .map(char::len_utf8)
            .sum();
        // Short runs are ordinary words, not tokens.
        if consumed < 16 {
            out.push_str(&rest[..consumed]);
        } else {
            out.push_str("REDACTED");
        }
        rest = &rest[consumed..];
    }
    out.push_str(rest);

    if out == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(out)
    }
}

pub fn redact_secrets(input: &str) -> Cow<'_, str> {
    let after_bearer = redact_bearer_token(input).into_owned();
    let value = redact_jwt(&after_bearer).into_owned();

    if value == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(value)
    }
}

/// Redacts a known token value verbatim, on top of the pattern-based rules.
pub fn redact_known_token(input: &str, token: &str) -> String {
    let mut out = redact_secrets(input).into_owned();
    let token = token.trim();
    if !token.is_empty() {
        out = out.replace(token, "REDACTED");
    }
    out
}
