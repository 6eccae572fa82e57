//! Trunk entry point: mounts the list and slideshow behaviors with the default DOM contract.

use rlist_ui::{boot_when_ready, config::UiConfig};

fn main() {
    boot_when_ready(UiConfig::default());
}
