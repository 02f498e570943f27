use reweave::ui::output;

fn main() {
    if let Err(err) = reweave::cli::run() {
        output::error(format!("{:#}", err));
        std::process::exit(1);
    }
}
