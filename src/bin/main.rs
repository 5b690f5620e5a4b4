fn main() {
  junkscriptions::main()
}
