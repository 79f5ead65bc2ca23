use gest_types::*;
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("gest VOCS basic usage");

    // Shorthand entries are normalized as they are added.
    let vocs = Vocs::builder()
        .variable("x", [-5.0, 5.0])
        .variable("y", [-3.0, 2.0])
        .variable("solver", discrete(["lbfgs", "adam"]))
        .objective("f", "MAXIMIZE")
        .constraint("c", ("LESS_THAN", 0.0))
        .constant("seed", 42)
        .observable_as("trace", "float")
        .build()?;

    println!("Inputs: {:?}", vocs.input_names());
    println!("Outputs: {:?}", vocs.output_names());
    println!("Continuous bounds: {:?}", vocs.bounds());

    // The same problem written as a document.
    let from_doc = Vocs::from_document(json!({
        "variables": {
            "x": [-5.0, 5.0],
            "y": [-3.0, 2.0],
            "solver": {"type": "DiscreteVariable", "values": ["adam", "lbfgs"]}
        },
        "objectives": {"f": "maximize"},
        "constraints": {"c": ["LESS_THAN", 0.0]},
        "constants": {"seed": 42},
        "observables": {"trace": "float"}
    }))?;
    println!("Document form matches builder form: {}", from_doc == vocs);

    // Serialization always emits longhand.
    println!("{}", vocs.to_json_pretty()?);

    // Invalid shorthand is rejected, never coerced.
    match Vocs::builder()
        .variable("x", [0.0, 1.0])
        .constraint("c", ("BOUNDS", [1.0, 0.0]))
        .build()
    {
        Ok(_) => println!("unexpectedly accepted reversed bounds"),
        Err(e) => println!("Rejected: {e}"),
    }

    Ok(())
}
