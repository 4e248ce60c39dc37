use org_inventory::app::startup;

#[tokio::main]
async fn main() {
    std::process::exit(startup::run().await);
}
