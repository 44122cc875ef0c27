use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = comps_api::Args::parse();
	comps_api::run(args).await
}
