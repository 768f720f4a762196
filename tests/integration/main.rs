//! Integration tests across all layers
//!
//! Source files on disk through loading, play sessions, and snapshots.

mod persistence;
mod play;
mod sources;

use std::fs;
use std::path::{Path, PathBuf};

/// A scratch directory removed on drop.
pub struct Scratch(PathBuf);

impl Scratch {
    pub fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("lanthorn-it-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.0.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

/// A small two-file world: rooms in one file, the cast in another.
pub const ROOMS: &str = r#"
include "cast.lan"

def region village { name = "Millbrook"; }
def location green {
    name = "Village Green";
    region = village;
    init { addExit(east, mill); }
}
def location mill {
    name = "Old Mill";
    region = village;
    init { addExit(west, green); }
}
"#;

pub const CAST: &str = r#"
def entity villager { coins = 2; location = green; }
def entity miller {
    name = `Miller`;
    kind = #creature;
    location = mill;
    when startWorld() {
        while true {
            await sleep(3);
            announce(self, "The millstone grinds.");
        }
    }
    when greet(actor, rest) { say(actor, "The miller nods."); }
}
def entity sack { name = `flour sack[s]`; kind = #item; location = mill; }
def command greet {
    noun = true;
    when greet(actor, rest) { say(actor, "You wave."); }
}
"#;
