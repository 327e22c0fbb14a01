fn main() -> anyhow::Result<()> {
    wbtc_cafe::run()
}
