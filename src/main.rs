#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]

fn main() {
    if let Err(e) = proximity_alert::run() {
        eprintln!("proximity-alert: {e}");
        std::process::exit(1);
    }
}
