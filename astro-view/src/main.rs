fn main() -> Result<(), Box<dyn std::error::Error>> {
    astro_view::run_desktop()
}
