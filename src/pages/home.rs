use leptos::prelude::*;
use serde_json::{Value, json};

use crate::components::network::{NetworkViewer, parse_records};

/// A short glycolysis backtrace in the shape the search endpoint returns.
fn sample_results() -> Value {
	json!([
		{
			"reaction": "R00299",
			"equation": "Glucose + ATP => Glucose-6P + ADP",
			"transition": "0 -> 1",
			"compound_generation": {"Glucose": 0, "ATP": 0, "Glucose-6P": 1, "ADP": 1},
			"ec_list": ["2.7.1.1"]
		},
		{
			"reaction": "R00771",
			"equation": "Glucose-6P => Fructose-6P",
			"transition": "1 -> 2",
			"compound_generation": {"Glucose-6P": 1, "Fructose-6P": 2},
			"ec_list": ["5.3.1.9"]
		},
		{
			"reaction": "R04779",
			"equation": "Fructose-6P + ATP => Fructose-BP + ADP",
			"transition": "2 -> 3",
			"compound_generation": {"Fructose-6P": 2, "ATP": 0, "Fructose-BP": 3, "ADP": 1},
			"ec_list": ["2.7.1.11"]
		},
		{
			"reaction": "R01068",
			"equation": "Fructose-BP => DHAP + GAP",
			"transition": "3 -> 4",
			"compound_generation": {"Fructose-BP": 3, "DHAP": 4, "GAP": 4},
			"ec_list": ["4.1.2.13"]
		},
		{
			"reaction": "R01015",
			"equation": "DHAP => GAP",
			"transition": "4 -> 4",
			"compound_generation": {"DHAP": 4, "GAP": 4},
			"ec_list": ["5.3.1.1"]
		},
		{
			"reaction": "R01061",
			"equation": "2 GAP + 2 NAD + 2 Pi => 2 BPG + 2 NADH",
			"transition": "4 -> 5",
			"compound_generation": {"GAP": 4, "NAD": 0, "Pi": 0, "BPG": 5, "NADH": 5},
			"ec_list": ["1.2.1.12"]
		},
		{
			"reaction": "R01512",
			"equation": "BPG + ADP => Phosphoglycerate + ATP",
			"transition": "5 -> 6",
			"compound_generation": {"BPG": 5, "ADP": 1, "Phosphoglycerate": 6},
			"ec_list": ["2.7.2.3", "N/A"]
		}
	])
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let records = Signal::stored(parse_records(&sample_results()));
	let parameters = Signal::stored(json!({"target": "Phosphoglycerate", "generations": 6}));

	view! {
		<div class="network-page">
			<h1>"Reaction Network"</h1>
			<p class="subtitle">
				"Drag nodes to reposition. Scroll to zoom. Drag background to pan. Ctrl+click a reaction to collapse it."
			</p>
			<NetworkViewer records=records parameters=parameters height="70vh" />
		</div>
	}
}
