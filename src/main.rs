use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    image_analyzer::cli::main()
}
