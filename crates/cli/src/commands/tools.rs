//! `mcpagent tools`: list the discovered catalog.

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (config, agent) = super::connect().await?;

    println!("Tools at {}:", config.mcp.url);
    if agent.bound_tools().is_empty() {
        println!("  (none)");
    }
    for tool in agent.bound_tools() {
        println!();
        println!("  {}", tool.name);
        if !tool.description.is_empty() {
            println!("    {}", tool.description);
        }
        for param in &tool.parameters {
            let marker = if param.required { "required" } else { "optional" };
            print!("    - {} ({}, {marker})", param.name, param.kind.schema_type());
            match &param.description {
                Some(desc) => println!(": {desc}"),
                None => println!(),
            }
        }
    }
    Ok(())
}
