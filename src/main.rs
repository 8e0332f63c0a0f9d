fn main() -> anyhow::Result<()> {
    birdbrush::run()
}
