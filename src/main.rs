fn main() -> anyhow::Result<()> {
    chorale::repl::start()
}
