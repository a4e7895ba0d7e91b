// Sat Oct 17 2026 - Alex

fn main() {
    std::process::exit(umb_racer::ui::cli::run());
}
