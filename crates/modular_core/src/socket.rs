//! Socket vocabulary.
//!
//! Sockets are named in catalog data and interned into small integer IDs.
//! ID 0 is always `"air"`: the socket exposed by anything that is not a
//! collapsed cell (missing layers, out-of-bounds, undecided neighbors).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Interned socket identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SocketId(pub u16);

impl SocketId {
    /// The reserved empty/void socket.
    pub const AIR: SocketId = SocketId(0);
}

pub const AIR_NAME: &str = "air";

/// Bidirectional name <-> ID table.
#[derive(Debug, Clone)]
pub struct SocketTable {
    names: Vec<String>,
    ids: HashMap<String, SocketId>,
}

impl SocketTable {
    pub fn new() -> Self {
        let mut ids = HashMap::new();
        ids.insert(AIR_NAME.to_string(), SocketId::AIR);
        Self {
            names: vec![AIR_NAME.to_string()],
            ids,
        }
    }

    /// Intern a socket name. Names are case-insensitive; empty means air.
    ///
    /// Returns `None` once the u16 ID space is exhausted.
    pub fn intern(&mut self, name: &str) -> Option<SocketId> {
        let key = normalize(name);
        if key.is_empty() {
            return Some(SocketId::AIR);
        }
        if let Some(&id) = self.ids.get(&key) {
            return Some(id);
        }
        let id = SocketId(u16::try_from(self.names.len()).ok()?);
        self.names.push(key.clone());
        self.ids.insert(key, id);
        Some(id)
    }

    /// Look up an already interned name.
    pub fn get(&self, name: &str) -> Option<SocketId> {
        let key = normalize(name);
        if key.is_empty() {
            return Some(SocketId::AIR);
        }
        self.ids.get(&key).copied()
    }

    pub fn name(&self, id: SocketId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        // "air" is always present
        false
    }
}

impl Default for SocketTable {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
