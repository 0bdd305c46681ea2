use formulix_rs::{Evaluator, UserFunction, UserFunctions, Variables};

fn main() {
    pretty_env_logger::init();

    let contexts = vec![
        Variables::from([("price".to_string(), 120.0), ("volume".to_string(), 3000.0)]),
        Variables::from([("price".to_string(), 80.0), ("volume".to_string(), 6000.0)]),
        Variables::from([("price".to_string(), 95.5)]),
    ];
    let functions = UserFunctions::from([(
        "weight".to_string(),
        UserFunction::unary(|v| (1.0 + v).log10()),
    )]);

    let expression = "price * weight(volume)";

    let evaluator = Evaluator::new();
    match evaluator.evaluate_batch(expression, &contexts, &functions) {
        Ok(results) => {
            for (i, result) in results.iter().enumerate() {
                match result {
                    Ok(value) => println!("Result {}: {}", i, value),
                    Err(err) => println!("Result {}: error: {}", i, err),
                }
            }
        }
        Err(err) => println!("Error: {}", err),
    }
}
