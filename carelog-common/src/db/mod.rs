//! Database access layer shared across the workspace

mod init;

pub use init::{create_schema, init_database};

/// Tables carrying a nullable `id_semestre` column, in backfill order.
///
/// This is the registry the semester lifecycle walks when attaching legacy
/// rows to a newly created semester. It deliberately excludes `semestre`
/// itself and the derived aggregate table `grad` (rebuilt from its source
/// rows instead of backfilled). Keep it in sync with the schema in
/// `init.rs`: a dated table missing from this list never gets its legacy
/// rows attached to any semester.
pub const SEMESTER_TABLES: &[&str] = &[
    "partecipazione_attivita",
    "bagno",
    "idratazione",
    "doccia",
    "peso",
    "pressione",
    "crisi_epilettica",
    "diario",
    "attivita_mirata",
    "comportamento_problema",
];
