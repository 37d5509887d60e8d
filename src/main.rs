fn main() -> anyhow::Result<()> {
    let command_line_interface = nbtshape::cli::CommandLineInterface::load();
    command_line_interface.run()
}
