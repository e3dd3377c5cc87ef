//! # Configuration Tests
//!
//! Deserialization, defaults, generation feature sets and validation.

use pretty_assertions::assert_eq;
use x86_paging::Mmu;
use x86_paging::config::*;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert!(!config.general.trace_walks);
    assert_eq!(config.cpu.generation, CpuGeneration::Pentium);
    assert!(config.validate().is_ok());
}

#[test]
fn test_empty_json_uses_defaults() {
    let config = Config::from_json("{}").unwrap();
    assert!(!config.general.trace_walks);
    assert_eq!(config.cpu.generation, CpuGeneration::Pentium);
    assert_eq!(config.cpu.pae, None);
}

#[test]
fn test_generation_feature_sets() {
    let i386 = CpuGeneration::I386.default_features();
    assert!(!i386.write_protect);
    assert!(!i386.large_pages());

    let i486 = CpuGeneration::I486.default_features();
    assert!(i486.write_protect);
    assert!(!i486.pse);

    let pentium = CpuGeneration::Pentium.default_features();
    assert!(pentium.pse);
    assert!(!pentium.pae);

    let p6 = CpuGeneration::PentiumPro.default_features();
    assert_eq!(
        p6,
        CpuFeatures {
            write_protect: true,
            pse: true,
            pae: true,
            pge: true,
            pse36: false,
        }
    );
}

#[test]
fn test_overrides_apply() {
    let json = r#"{ "cpu": { "generation": "Pentium", "pse36": true, "pge": true } }"#;
    let features = Config::from_json(json).unwrap().cpu.features().unwrap();
    assert!(features.pse36);
    assert!(features.pge);
    assert!(!features.pae);
}

#[test]
fn test_generation_aliases() {
    let config = Config::from_json(r#"{ "cpu": { "generation": "486" } }"#).unwrap();
    assert_eq!(config.cpu.generation, CpuGeneration::I486);
    let config = Config::from_json(r#"{ "cpu": { "generation": "P6" } }"#).unwrap();
    assert_eq!(config.cpu.generation, CpuGeneration::PentiumPro);
}

#[test]
fn test_pse36_requires_pse() {
    let json = r#"{ "cpu": { "generation": "I486", "pse36": true } }"#;
    assert!(matches!(Config::from_json(json), Err(ConfigError::Pse36WithoutPse)));
}

#[test]
fn test_pae_requires_write_protect() {
    let json = r#"{ "cpu": { "generation": "I386", "pae": true } }"#;
    match Config::from_json(json) {
        Err(ConfigError::PaeWithoutWriteProtect { generation }) => {
            assert_eq!(generation, CpuGeneration::I386);
        }
        other => panic!("expected PaeWithoutWriteProtect, got {other:?}"),
    }
}

#[test]
fn test_malformed_json() {
    assert!(matches!(Config::from_json("{ not json"), Err(ConfigError::Parse(_))));
    assert!(matches!(
        Config::from_json(r#"{ "cpu": { "generation": "Z80" } }"#),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_mmu_from_config() {
    let config = Config::from_json(r#"{ "general": { "trace_walks": true }, "cpu": { "generation": "PentiumPro" } }"#)
        .unwrap();
    let mmu = Mmu::new(&config).unwrap();
    assert!(mmu.features().pae);
    assert!(!mmu.control_registers().paging_enabled());
}

#[test]
fn test_mmu_rejects_invalid_config() {
    let mut config = Config::default();
    config.cpu = CpuConfig {
        pse: Some(false),
        pse36: Some(true),
        ..CpuConfig::for_generation(CpuGeneration::Pentium)
    };
    assert!(Mmu::new(&config).is_err());
}
