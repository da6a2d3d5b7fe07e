//! Browser entry point. Built with `trunk`.

fn main() {
    flowforge_dashboard::start();
}
