use leptos::prelude::*;
use reaction_network_viewer::{App, init_logging};

fn main() {
	init_logging();
	mount_to_body(|| {
		view! { <App /> }
	})
}
