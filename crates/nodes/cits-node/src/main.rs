use clap::Parser;

use cits_node::node::builder::NodeBuilder;

#[derive(Parser, Debug)]
#[command(author, version, long_about = None)]
struct CliArgs {
    #[arg(short = 'c', long, value_name = "CONFIG_FILE")]
    config: String,
}

fn main() {
    let args = CliArgs::parse();
    let builder = NodeBuilder::new(&args.config);
    let node = builder.build();
    node.start();
    println!("STATUS: {} stack is up, all workers released", node.info());
    node.join();
}
