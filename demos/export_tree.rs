use formulix_rs::export_tree;

fn main() {
    pretty_env_logger::init();

    let expression = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "a + 2 - sin(-0.3) * (b - c)".to_string());

    match export_tree(&expression) {
        Ok(graph) => {
            print!("{}", graph.to_dot());
            match serde_json::to_string_pretty(&graph) {
                Ok(json) => eprintln!("{}", json),
                Err(err) => eprintln!("Error: {}", err),
            }
        }
        Err(err) => eprintln!("Error: {}", err),
    }
}
