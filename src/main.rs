fn main() {
    pitherm_lib::run()
}
