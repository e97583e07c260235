//! Helper tool simulating a full race against an in-process store.

#[cfg(feature = "tool-race-sim")]
mod race_sim;

fn main() -> anyhow::Result<()> {
    #[cfg(feature = "tool-race-sim")]
    {
        race_sim::run()?;
    }
    Ok(())
}
