//! Module catalog: the immutable set of placeable modules for one solve.
//!
//! Modules are described by [`ModuleDef`] (serde-friendly, name based) and
//! resolved by [`Catalog::from_defs`] into [`Module`]s with integer IDs,
//! interned sockets and precomputed per-direction compatibility sets.
//!
//! Compatibility is derived by symmetric socket matching:
//! `A.allowed[d]` contains `B` iff `A.socket[d] == B.socket[opposite(d)]`.
//! A module may replace the derived set for a direction with an explicit
//! name list. The final relation is always kept symmetric
//! (`B ∈ A.allowed[d] ⇔ A ∈ B.allowed[opposite(d)]`) so that propagation in
//! either direction agrees.

use crate::direction::Direction;
use crate::domain::{ModuleId, ModuleSet};
use crate::error::CatalogError;
use crate::socket::{SocketId, SocketTable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;

/// Role of a module in a vertical stack; drives height-biased weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleRole {
    /// Walls, pillars and anything between ground and roof
    #[default]
    Body,
    /// Top of a stack
    Roof,
    /// Ground plate, only valid at y = 0
    Base,
    /// Empty space, valid anywhere
    Air,
}

/// Socket names for the six faces. Empty strings mean air.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceSockets {
    pub pos_x: String,
    pub neg_x: String,
    pub pos_y: String,
    pub neg_y: String,
    pub pos_z: String,
    pub neg_z: String,
}

impl FaceSockets {
    /// Same socket on every face.
    pub fn uniform(name: &str) -> Self {
        Self {
            pos_x: name.to_string(),
            neg_x: name.to_string(),
            pos_y: name.to_string(),
            neg_y: name.to_string(),
            pos_z: name.to_string(),
            neg_z: name.to_string(),
        }
    }

    pub fn get(&self, direction: Direction) -> &str {
        match direction {
            Direction::PosX => &self.pos_x,
            Direction::NegX => &self.neg_x,
            Direction::PosY => &self.pos_y,
            Direction::NegY => &self.neg_y,
            Direction::PosZ => &self.pos_z,
            Direction::NegZ => &self.neg_z,
        }
    }

    pub fn set(&mut self, direction: Direction, name: &str) {
        let slot = match direction {
            Direction::PosX => &mut self.pos_x,
            Direction::NegX => &mut self.neg_x,
            Direction::PosY => &mut self.pos_y,
            Direction::NegY => &mut self.neg_y,
            Direction::PosZ => &mut self.pos_z,
            Direction::NegZ => &mut self.neg_z,
        };
        *slot = name.to_string();
    }
}

/// Optional explicit neighbor lists. A `Some` entry replaces the
/// socket-derived compatibility for that direction; `Some(vec![])` allows nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborOverrides {
    pub pos_x: Option<Vec<String>>,
    pub neg_x: Option<Vec<String>>,
    pub pos_y: Option<Vec<String>>,
    pub neg_y: Option<Vec<String>>,
    pub pos_z: Option<Vec<String>>,
    pub neg_z: Option<Vec<String>>,
}

impl NeighborOverrides {
    pub fn get(&self, direction: Direction) -> Option<&[String]> {
        let slot = match direction {
            Direction::PosX => &self.pos_x,
            Direction::NegX => &self.neg_x,
            Direction::PosY => &self.pos_y,
            Direction::NegY => &self.neg_y,
            Direction::PosZ => &self.pos_z,
            Direction::NegZ => &self.neg_z,
        };
        slot.as_deref()
    }

    pub fn set(&mut self, direction: Direction, names: Vec<String>) {
        let slot = match direction {
            Direction::PosX => &mut self.pos_x,
            Direction::NegX => &mut self.neg_x,
            Direction::PosY => &mut self.pos_y,
            Direction::NegY => &mut self.neg_y,
            Direction::PosZ => &mut self.pos_z,
            Direction::NegZ => &mut self.neg_z,
        };
        *slot = Some(names);
    }
}

/// One neighbor predicate of a variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRuleDef {
    pub direction: Direction,
    pub socket: String,
    /// Pass only when the neighbor does NOT expose `socket`
    #[serde(default)]
    pub negate: bool,
}

/// A visual sub-choice of a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantDef {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: f32,
    /// Inclusive `[min_y, max_y]` gate
    #[serde(default)]
    pub height: Option<[i32; 2]>,
    #[serde(default)]
    pub rules: Vec<VariantRuleDef>,
}

impl VariantDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            weight: 1.0,
            height: None,
            rules: Vec::new(),
        }
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_height(mut self, min_y: i32, max_y: i32) -> Self {
        self.height = Some([min_y, max_y]);
        self
    }

    pub fn with_rule(mut self, direction: Direction, socket: &str, negate: bool) -> Self {
        self.rules.push(VariantRuleDef {
            direction,
            socket: socket.to_string(),
            negate,
        });
        self
    }
}

/// Serializable description of one module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDef {
    pub name: String,
    #[serde(default)]
    pub role: ModuleRole,
    #[serde(default = "default_weight")]
    pub spawn_weight: f32,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub sockets: FaceSockets,
    #[serde(default)]
    pub neighbors: NeighborOverrides,
    #[serde(default)]
    pub variants: Vec<VariantDef>,
}

fn default_weight() -> f32 {
    1.0
}

fn default_category() -> String {
    "General".to_string()
}

impl ModuleDef {
    pub fn new(name: &str, role: ModuleRole) -> Self {
        Self {
            name: name.to_string(),
            role,
            spawn_weight: 1.0,
            category: default_category(),
            sockets: FaceSockets::default(),
            neighbors: NeighborOverrides::default(),
            variants: Vec::new(),
        }
    }

    pub fn with_spawn_weight(mut self, weight: f32) -> Self {
        self.spawn_weight = weight;
        self
    }

    pub fn with_sockets(mut self, sockets: FaceSockets) -> Self {
        self.sockets = sockets;
        self
    }

    pub fn with_socket(mut self, direction: Direction, name: &str) -> Self {
        self.sockets.set(direction, name);
        self
    }

    /// Replace socket-derived compatibility in `direction` with `names`.
    pub fn with_neighbors(mut self, direction: Direction, names: &[&str]) -> Self {
        self.neighbors
            .set(direction, names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn with_variant(mut self, variant: VariantDef) -> Self {
        self.variants.push(variant);
        self
    }
}

/// Top-level catalog document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDef {
    pub modules: Vec<ModuleDef>,
}

/// Resolved variant rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantRule {
    pub direction: Direction,
    pub socket: SocketId,
    pub negate: bool,
}

impl VariantRule {
    /// Whether a neighbor exposing `neighbor_socket` satisfies this rule.
    #[inline]
    pub fn passes(&self, neighbor_socket: SocketId) -> bool {
        (neighbor_socket == self.socket) != self.negate
    }
}

/// Resolved variant.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub name: String,
    pub weight: f32,
    pub height_range: Option<(i32, i32)>,
    pub rules: Vec<VariantRule>,
}

impl Variant {
    pub fn allows_height(&self, y: i32) -> bool {
        match self.height_range {
            Some((min, max)) => y >= min && y <= max,
            None => true,
        }
    }
}

/// A placeable module with resolved compatibility.
#[derive(Debug, Clone)]
pub struct Module {
    id: ModuleId,
    name: String,
    category: String,
    role: ModuleRole,
    spawn_weight: f32,
    sockets: [SocketId; 6],
    allowed: [ModuleSet; 6],
    variants: Vec<Variant>,
    supports_roof: bool,
}

impl Module {
    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn role(&self) -> ModuleRole {
        self.role
    }

    pub fn spawn_weight(&self) -> f32 {
        self.spawn_weight
    }

    /// Socket exposed on the face in `direction`.
    pub fn socket(&self, direction: Direction) -> SocketId {
        self.sockets[direction.index()]
    }

    /// Modules that may sit next to this one in `direction`.
    pub fn allowed(&self, direction: Direction) -> &ModuleSet {
        &self.allowed[direction.index()]
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// True if some Roof module may sit directly above this one.
    pub fn supports_roof(&self) -> bool {
        self.supports_roof
    }
}

/// The immutable module catalog, shared read-only by every cell.
#[derive(Debug, Clone)]
pub struct Catalog {
    modules: Vec<Module>,
    by_name: HashMap<String, ModuleId>,
    sockets: SocketTable,
}

impl Catalog {
    /// Resolve module definitions into a catalog. IDs follow definition order.
    pub fn from_defs(defs: &[ModuleDef]) -> Result<Self, CatalogError> {
        if defs.len() > u16::MAX as usize {
            return Err(CatalogError::TooMany("modules"));
        }
        let count = defs.len();

        let mut by_name = HashMap::with_capacity(count);
        for (i, def) in defs.iter().enumerate() {
            if by_name.insert(def.name.clone(), ModuleId(i as u16)).is_some() {
                return Err(CatalogError::DuplicateModule(def.name.clone()));
            }
            if !def.spawn_weight.is_finite() || def.spawn_weight < 0.0 {
                return Err(CatalogError::InvalidSpawnWeight {
                    module: def.name.clone(),
                    weight: def.spawn_weight,
                });
            }
        }

        let mut sockets = SocketTable::new();
        let mut face_sockets: Vec<[SocketId; 6]> = Vec::with_capacity(count);
        for def in defs {
            let mut faces = [SocketId::AIR; 6];
            for d in Direction::ALL {
                faces[d.index()] = sockets
                    .intern(def.sockets.get(d))
                    .ok_or(CatalogError::TooMany("sockets"))?;
            }
            face_sockets.push(faces);
        }

        let mut variants: Vec<Vec<Variant>> = Vec::with_capacity(count);
        for def in defs {
            let mut resolved = Vec::with_capacity(def.variants.len());
            for v in &def.variants {
                resolved.push(resolve_variant(def, v, &mut sockets)?);
            }
            variants.push(resolved);
        }

        // Per-direction compatibility, socket-derived unless overridden
        let mut allowed: Vec<[ModuleSet; 6]> = Vec::with_capacity(count);
        for (a, def) in defs.iter().enumerate() {
            let mut sets: [ModuleSet; 6] = std::array::from_fn(|_| ModuleSet::empty(count));
            for d in Direction::ALL {
                let set = &mut sets[d.index()];
                match def.neighbors.get(d) {
                    Some(names) => {
                        for n in names {
                            let id = by_name.get(n).copied().ok_or_else(|| {
                                CatalogError::UnknownNeighbor {
                                    module: def.name.clone(),
                                    neighbor: n.clone(),
                                }
                            })?;
                            set.insert(id);
                        }
                    }
                    None => {
                        let mine = face_sockets[a][d.index()];
                        for (b, faces) in face_sockets.iter().enumerate() {
                            if faces[d.opposite().index()] == mine {
                                set.insert(ModuleId(b as u16));
                            }
                        }
                    }
                }
            }
            allowed.push(sets);
        }

        // Keep only mutually agreed pairs
        let snapshot = allowed.clone();
        for (a, sets) in allowed.iter_mut().enumerate() {
            for d in Direction::ALL {
                let opposite = d.opposite().index();
                let keep: Vec<ModuleId> = sets[d.index()]
                    .iter()
                    .filter(|b| snapshot[b.index()][opposite].contains(ModuleId(a as u16)))
                    .collect();
                sets[d.index()] = ModuleSet::from_ids(count, keep);
            }
        }

        let mut modules = Vec::with_capacity(count);
        for (i, ((def, sets), vars)) in defs
            .iter()
            .zip(allowed)
            .zip(variants)
            .enumerate()
        {
            let supports_roof = sets[Direction::PosY.index()]
                .iter()
                .any(|b| defs[b.index()].role == ModuleRole::Roof);
            modules.push(Module {
                id: ModuleId(i as u16),
                name: def.name.clone(),
                category: def.category.clone(),
                role: def.role,
                spawn_weight: def.spawn_weight,
                sockets: face_sockets[i],
                allowed: sets,
                variants: vars,
                supports_roof,
            });
        }

        Ok(Self {
            modules,
            by_name,
            sockets,
        })
    }

    pub fn from_def(def: &CatalogDef) -> Result<Self, CatalogError> {
        Self::from_defs(&def.modules)
    }

    /// Parse a JSON catalog document (`{ "modules": [...] }`).
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let def: CatalogDef = serde_json::from_str(json)?;
        Self::from_def(&def)
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let def: CatalogDef = serde_json::from_reader(reader)?;
        Self::from_def(&def)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(id.index())
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn id_of(&self, name: &str) -> Option<ModuleId> {
        self.by_name.get(name).copied()
    }

    /// Look up a module by name.
    pub fn by_name(&self, name: &str) -> Option<&Module> {
        self.id_of(name).and_then(|id| self.module(id))
    }

    pub fn sockets(&self) -> &SocketTable {
        &self.sockets
    }

    /// Domain containing every module.
    pub fn full_set(&self) -> ModuleSet {
        ModuleSet::full(self.len())
    }

    pub fn contains(&self, id: ModuleId) -> bool {
        id.index() < self.modules.len()
    }

    /// Whether `b` may sit next to `a` in `direction`.
    pub fn allows(&self, a: ModuleId, direction: Direction, b: ModuleId) -> bool {
        self.module(a)
            .map(|m| m.allowed(direction).contains(b))
            .unwrap_or(false)
    }
}

fn resolve_variant(
    module: &ModuleDef,
    def: &VariantDef,
    sockets: &mut SocketTable,
) -> Result<Variant, CatalogError> {
    let invalid = |reason: &str| CatalogError::InvalidVariant {
        module: module.name.clone(),
        variant: def.name.clone(),
        reason: reason.to_string(),
    };

    if !def.weight.is_finite() || def.weight < 0.0 {
        return Err(invalid("weight must be finite and non-negative"));
    }
    let height_range = match def.height {
        Some([min, max]) if min > max => return Err(invalid("min height above max height")),
        Some([min, max]) => Some((min, max)),
        None => None,
    };
    let mut rules = Vec::with_capacity(def.rules.len());
    for r in &def.rules {
        let socket = sockets
            .intern(&r.socket)
            .ok_or(CatalogError::TooMany("sockets"))?;
        rules.push(VariantRule {
            direction: r.direction,
            socket,
            negate: r.negate,
        });
    }
    Ok(Variant {
        name: def.name.clone(),
        weight: def.weight,
        height_range,
        rules,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall_and_air() -> Vec<ModuleDef> {
        vec![
            ModuleDef::new("air", ModuleRole::Air),
            ModuleDef::new("wall", ModuleRole::Body)
                .with_socket(Direction::PosX, "wall")
                .with_socket(Direction::NegX, "wall"),
        ]
    }

    #[test]
    fn test_socket_matching_is_symmetric() {
        let catalog = Catalog::from_defs(&wall_and_air()).unwrap();
        let air = catalog.id_of("air").unwrap();
        let wall = catalog.id_of("wall").unwrap();

        // wall|wall along X, air|air elsewhere
        assert!(catalog.allows(wall, Direction::PosX, wall));
        assert!(!catalog.allows(wall, Direction::PosX, air));
        assert!(!catalog.allows(air, Direction::PosX, wall));
        assert!(catalog.allows(air, Direction::PosX, air));
        assert!(catalog.allows(wall, Direction::PosY, air));
        assert!(catalog.allows(air, Direction::NegY, wall));

        for a in catalog.modules() {
            for d in Direction::ALL {
                for b in a.allowed(d).iter() {
                    assert!(catalog.allows(b, d.opposite(), a.id()));
                }
            }
        }
    }

    #[test]
    fn test_explicit_neighbors_override_sockets() {
        let defs = vec![
            ModuleDef::new("a", ModuleRole::Base).with_neighbors(Direction::PosX, &["b"]),
            ModuleDef::new("b", ModuleRole::Base).with_neighbors(Direction::NegX, &["a"]),
        ];
        let catalog = Catalog::from_defs(&defs).unwrap();
        let a = catalog.id_of("a").unwrap();
        let b = catalog.id_of("b").unwrap();
        assert!(catalog.allows(a, Direction::PosX, b));
        assert!(!catalog.allows(a, Direction::PosX, a));
        assert!(catalog.allows(b, Direction::NegX, a));
        assert!(!catalog.allows(b, Direction::NegX, b));
        // remaining faces are air on both modules
        assert!(catalog.allows(b, Direction::PosX, a));
        assert!(!catalog.allows(a, Direction::NegX, a));
    }

    #[test]
    fn test_one_sided_override_is_dropped() {
        let defs = vec![
            ModuleDef::new("a", ModuleRole::Body).with_neighbors(Direction::PosX, &["b"]),
            ModuleDef::new("b", ModuleRole::Body).with_neighbors(Direction::NegX, &[]),
        ];
        let catalog = Catalog::from_defs(&defs).unwrap();
        let a = catalog.id_of("a").unwrap();
        let b = catalog.id_of("b").unwrap();
        assert!(!catalog.allows(a, Direction::PosX, b));
        assert!(catalog.module(a).unwrap().allowed(Direction::PosX).is_empty());
    }

    #[test]
    fn test_supports_roof() {
        let defs = vec![
            ModuleDef::new("wall", ModuleRole::Body).with_socket(Direction::PosY, "top"),
            ModuleDef::new("roof", ModuleRole::Roof).with_socket(Direction::NegY, "top"),
            ModuleDef::new("post", ModuleRole::Body).with_socket(Direction::PosY, "thin"),
        ];
        let catalog = Catalog::from_defs(&defs).unwrap();
        assert!(catalog.by_name("wall").unwrap().supports_roof());
        assert!(!catalog.by_name("post").unwrap().supports_roof());
    }

    #[test]
    fn test_duplicate_and_unknown_names() {
        let dup = vec![
            ModuleDef::new("x", ModuleRole::Body),
            ModuleDef::new("x", ModuleRole::Air),
        ];
        assert_eq!(
            Catalog::from_defs(&dup).unwrap_err(),
            CatalogError::DuplicateModule("x".into())
        );

        let unknown = vec![ModuleDef::new("x", ModuleRole::Body)
            .with_neighbors(Direction::PosZ, &["ghost"])];
        assert!(matches!(
            Catalog::from_defs(&unknown),
            Err(CatalogError::UnknownNeighbor { .. })
        ));
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let bad = vec![ModuleDef::new("x", ModuleRole::Body).with_spawn_weight(-1.0)];
        assert!(matches!(
            Catalog::from_defs(&bad),
            Err(CatalogError::InvalidSpawnWeight { .. })
        ));

        let bad_variant = vec![ModuleDef::new("x", ModuleRole::Body)
            .with_variant(VariantDef::new("v").with_height(3, 1))];
        assert!(matches!(
            Catalog::from_defs(&bad_variant),
            Err(CatalogError::InvalidVariant { .. })
        ));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "modules": [
                { "name": "ground", "role": "base",
                  "sockets": { "pos_y": "floor" } },
                { "name": "wall", "spawn_weight": 2.5,
                  "sockets": { "neg_y": "floor", "pos_x": "wall", "neg_x": "wall" },
                  "variants": [
                    { "name": "corner", "rules": [ { "direction": "pos_x", "socket": "air" } ] }
                  ] }
            ]
        }"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        assert_eq!(catalog.len(), 2);
        let wall = catalog.by_name("wall").unwrap();
        assert_eq!(wall.role(), ModuleRole::Body);
        assert_eq!(wall.spawn_weight(), 2.5);
        assert_eq!(wall.category(), "General");
        assert_eq!(wall.variants().len(), 1);
        assert_eq!(wall.variants()[0].rules[0].socket, SocketId::AIR);

        let ground = catalog.id_of("ground").unwrap();
        assert!(catalog.allows(ground, Direction::PosY, wall.id()));
    }

    #[test]
    fn test_variant_rule_negate() {
        let rule = VariantRule {
            direction: Direction::PosX,
            socket: SocketId(3),
            negate: true,
        };
        assert!(!rule.passes(SocketId(3)));
        assert!(rule.passes(SocketId::AIR));
    }
}
