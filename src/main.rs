fn main() {
  minicloud_lib::run()
}
