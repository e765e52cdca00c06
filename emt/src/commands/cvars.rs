//! Cvar commands - get/set/unset/toggle/list against a config file
//!
//! The tool has no engine attached, so every cvar in the file loads as an
//! AUTO placeholder; writes go through the normal policy gate (placeholders
//! carry no policy flags, so they apply) and the file is rewritten after
//! each mutation.

use std::path::{Path, PathBuf};

use ecvar::{archive, console, CvarFlags, CvarSet, CvarValue, SetOutcome};
use tracing::{debug, info};

use crate::error::{EmtError, Result};

/// Arguments shared by every cvar command
pub struct CvarArgs {
    pub file: PathBuf,
    pub verbose: bool,
}

/// Load the config file into a fresh set; a missing file is an empty set
fn load(path: &Path) -> Result<CvarSet> {
    let mut set = CvarSet::new();
    if path.exists() {
        let taken = archive::load(&mut set, path)?;
        debug!("loaded {} cvars from {}", taken, path.display());
    } else {
        debug!("{} does not exist yet, starting empty", path.display());
    }
    Ok(set)
}

fn save(set: &CvarSet, path: &Path) -> Result<()> {
    archive::save(set, path)?;
    debug!("wrote {}", path.display());
    Ok(())
}

fn rejected(outcome: SetOutcome) -> Option<&'static str> {
    match outcome {
        SetOutcome::Applied => None,
        SetOutcome::Latched => Some("latched until the next game restart"),
        SetOutcome::Dropped => Some("cvar is write-protected"),
        SetOutcome::RejectedByArbitration => Some("only the net arbitrator may change it"),
    }
}

/// `emt get <name>`
pub fn run_get(args: CvarArgs, name: &str) -> Result<()> {
    let set = load(&args.file)?;
    let value = console::get_as_string(&set, name)?;
    if args.verbose {
        let cvar = set.get(name)?;
        println!("{} {} = {}", cvar.flags().letters(), cvar.name(), value);
    } else {
        println!("{value}");
    }
    Ok(())
}

/// `emt set <name> <value>`: creates the cvar if the file does not know it
pub fn run_set(args: CvarArgs, name: &str, value: &str) -> Result<()> {
    let mut set = load(&args.file)?;
    if set.find(name).is_none() {
        info!("creating new cvar {name}");
        set.register(
            name,
            CvarValue::String(String::new()),
            CvarFlags::ARCHIVE | CvarFlags::AUTO | CvarFlags::UNSETTABLE,
            None,
        )?;
    }
    let outcome = console::set_from_string(&mut set, name, value)?;
    if let Some(reason) = rejected(outcome) {
        return Err(EmtError::Rejected(format!("{name}: {reason}")));
    }
    save(&set, &args.file)?;
    println!("{} = {}", name, console::get_as_string(&set, name)?);
    Ok(())
}

/// `emt unset <name>`
pub fn run_unset(args: CvarArgs, name: &str) -> Result<()> {
    let mut set = load(&args.file)?;
    set.unset(name)?;
    save(&set, &args.file)?;
    info!("removed {name}");
    Ok(())
}

/// `emt toggle <name>`
pub fn run_toggle(args: CvarArgs, name: &str) -> Result<()> {
    let mut set = load(&args.file)?;
    let (next, outcome) = console::toggle(&mut set, name)?;
    if let Some(reason) = rejected(outcome) {
        return Err(EmtError::Rejected(format!("{name}: {reason}")));
    }
    save(&set, &args.file)?;
    println!("{name} = {next}");
    Ok(())
}

/// `emt list [filter]`
pub fn run_list(args: CvarArgs, filter: Option<&str>) -> Result<()> {
    let set = load(&args.file)?;
    let lines = console::list(&set, filter);
    let count = lines.len();
    for line in lines {
        println!("{line}");
    }
    println!("{count} cvars");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips_through_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("engine.ini");
        let args = || CvarArgs {
            file: file.clone(),
            verbose: false,
        };

        run_set(args(), "snd_volume", "0.5").unwrap();

        let set = load(&file).unwrap();
        assert_eq!(console::get_as_string(&set, "snd_volume").unwrap(), "0.5");
    }

    #[test]
    fn unset_removes_from_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("engine.ini");

        run_set(
            CvarArgs {
                file: file.clone(),
                verbose: false,
            },
            "doomed",
            "1",
        )
        .unwrap();
        run_unset(
            CvarArgs {
                file: file.clone(),
                verbose: false,
            },
            "doomed",
        )
        .unwrap();

        let set = load(&file).unwrap();
        assert!(set.find("doomed").is_none());
    }

    #[test]
    fn get_unknown_cvar_fails() {
        let dir = tempfile::tempdir().unwrap();
        let args = CvarArgs {
            file: dir.path().join("engine.ini"),
            verbose: false,
        };
        assert!(run_get(args, "nosuch").is_err());
    }
}
