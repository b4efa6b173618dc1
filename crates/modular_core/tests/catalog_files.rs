use modular_core::{Catalog, CatalogError, Direction, ModuleRole, SocketId, SolverConfig};
use std::fs::File;
use std::io::Write;
use tempfile::NamedTempFile;

const HOUSE: &str = r#"{
    "modules": [
        { "name": "floor", "role": "base", "category": "Ground",
          "sockets": { "pos_y": "slab", "pos_x": "paving", "neg_x": "paving",
                       "pos_z": "paving", "neg_z": "paving" } },
        { "name": "wall", "role": "body", "spawn_weight": 2.0,
          "sockets": { "neg_y": "slab", "pos_y": "slab" },
          "variants": [
            { "name": "window", "weight": 3.0, "height": [1, 3] },
            { "name": "door", "height": [1, 1],
              "rules": [ { "direction": "neg_x", "socket": "air" } ] }
          ] },
        { "name": "roof", "role": "roof", "sockets": { "neg_y": "slab" } },
        { "name": "air", "role": "air",
          "neighbors": { "neg_y": ["roof", "air"] } }
    ]
}"#;

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn load_catalog_from_file() {
    let file = write_temp(HOUSE);
    let catalog = Catalog::from_json_reader(File::open(file.path()).unwrap()).unwrap();

    assert_eq!(catalog.len(), 4);
    let floor = catalog.by_name("floor").unwrap();
    assert_eq!(floor.role(), ModuleRole::Base);
    assert_eq!(floor.category(), "Ground");

    let wall = catalog.by_name("wall").unwrap();
    assert_eq!(wall.spawn_weight(), 2.0);
    assert!(wall.supports_roof());
    assert_eq!(wall.variants().len(), 2);
    assert_eq!(wall.variants()[0].height_range, Some((1, 3)));
    assert_eq!(wall.variants()[1].rules[0].socket, SocketId::AIR);

    // explicit list narrows air's -Y to roof and air
    let air = catalog.id_of("air").unwrap();
    let below_air: Vec<_> = catalog
        .module(air)
        .unwrap()
        .allowed(Direction::NegY)
        .iter()
        .collect();
    assert_eq!(
        below_air,
        vec![catalog.id_of("roof").unwrap(), catalog.id_of("air").unwrap()]
    );
    // and the relation stays symmetric
    assert!(!catalog.allows(catalog.id_of("floor").unwrap(), Direction::PosY, air));
}

#[test]
fn bad_file_reports_parse_error() {
    let file = write_temp("{ \"modules\": [ { \"role\": \"body\" } ] }");
    let err = Catalog::from_json_reader(File::open(file.path()).unwrap()).unwrap_err();
    assert!(matches!(err, CatalogError::Parse(_)));
    assert!(err.to_string().starts_with("catalog parse error"));
}

#[test]
fn unknown_neighbor_in_file() {
    let file = write_temp(
        r#"{ "modules": [ { "name": "a", "neighbors": { "pos_x": ["ghost"] } } ] }"#,
    );
    let err = Catalog::from_json_reader(File::open(file.path()).unwrap()).unwrap_err();
    assert_eq!(
        err,
        CatalogError::UnknownNeighbor {
            module: "a".into(),
            neighbor: "ghost".into()
        }
    );
}

#[test]
fn solver_config_from_file() {
    let file = write_temp(r#"{ "max_retries": 2, "yield_every": 10 }"#);
    let config: SolverConfig =
        serde_json::from_reader(File::open(file.path()).unwrap()).unwrap();
    assert_eq!(config.max_attempts(), 3);
    assert_eq!(config.yield_every, 10);
    assert_eq!(config.seed, None);
}
