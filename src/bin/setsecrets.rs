fn main() -> color_eyre::eyre::Result<()> {
    setsecrets::cli::main()
}
