use formulix_rs::{formulix_fn, Evaluator, UserFunction, UserFunctions, Variables};

#[formulix_fn]
fn hypot(a: f64, b: f64) -> f64 {
    (a * a + b * b).sqrt()
}

fn main() {
    pretty_env_logger::init();

    let evaluator = Evaluator::new();

    let variables = Variables::from([("price".to_string(), 120.0), ("volume".to_string(), 3000.0)]);
    let functions = UserFunctions::from([
        ("hypot".to_string(), hypot()),
        ("double".to_string(), UserFunction::unary(|x| x * 2.0)),
    ]);

    let expression = "double(price) + hypot(3, 4) - volume / 100";
    match evaluator.evaluate_expression(expression, &variables, &functions) {
        Ok(result) => println!("{} = {}", expression, result),
        Err(err) => println!("Error: {}", err),
    }

    // A tree can be parsed once and evaluated against many bindings.
    let ast = match evaluator.parse_expression("-price ^ 2 / sqrt(volume)") {
        Ok(ast) => ast,
        Err(err) => {
            println!("Error: {}", err);
            return;
        }
    };
    println!("Parsed: {}", ast);
    for price in [1.0, 2.5, 10.0] {
        let variables = Variables::from([("price".to_string(), price), ("volume".to_string(), 4.0)]);
        match evaluator.evaluate(&ast, &variables, &functions) {
            Ok(result) => println!("price = {}: {}", price, result),
            Err(err) => println!("Error: {}", err),
        }
    }

    if let Err(err) = evaluator.evaluate_expression("price +", &variables, &functions) {
        println!("Error: {}", err);
    }
}
