use crate::distributions::adoptium::{AdoptImplementation, Adopt, Semeru, Temurin};
use crate::distributions::corretto::Corretto;
use crate::distributions::dragonwell::Dragonwell;
use crate::distributions::graalvm::GraalVm;
use crate::distributions::jetbrains::JetBrains;
use crate::distributions::kona::Kona;
use crate::distributions::liberica::Liberica;
use crate::distributions::local::LocalDistribution;
use crate::distributions::microsoft::Microsoft;
use crate::distributions::oracle::Oracle;
use crate::distributions::sapmachine::SapMachine;
use crate::distributions::zulu::Zulu;
use crate::distributions::{user_error, Distribution, DistributionError};
use crate::installer::InstallerOptions;
use error_stack::Report;
use std::path::PathBuf;

/// Every accepted distribution key, with a short description.
const AVAILABLE: &[(&str, &str)] = &[
    ("adopt", "AdoptOpenJDK HotSpot (legacy, moved to temurin)"),
    ("adopt-hotspot", "AdoptOpenJDK HotSpot (legacy, moved to temurin)"),
    ("adopt-openj9", "AdoptOpenJDK OpenJ9 (legacy, moved to semeru)"),
    ("temurin", "Eclipse Temurin"),
    ("semeru", "IBM Semeru Runtime Open Edition"),
    ("zulu", "Azul Zulu OpenJDK"),
    ("liberica", "BellSoft Liberica"),
    ("microsoft", "Microsoft Build of OpenJDK"),
    ("corretto", "Amazon Corretto"),
    ("oracle", "Oracle JDK"),
    ("graalvm", "Oracle GraalVM"),
    ("dragonwell", "Alibaba Dragonwell"),
    ("sapmachine", "SAP SapMachine"),
    ("jetbrains", "JetBrains Runtime"),
    ("kona", "Tencent Kona"),
    ("jdkfile", "A JDK archive already on disk, given with --jdk-file"),
];

impl Distribution {
    /// The installer registered under `name`. `jdk_file` is only used by `jdkfile`.
    pub fn from_name(
        name: &str,
        options: InstallerOptions,
        jdk_file: Option<PathBuf>,
    ) -> Result<Distribution, Report<DistributionError>> {
        let distribution = match name {
            "adopt" | "adopt-hotspot" => Adopt::new(options, AdoptImplementation::Hotspot).into(),
            "adopt-openj9" => Adopt::new(options, AdoptImplementation::OpenJ9).into(),
            "temurin" => Temurin::new(options).into(),
            "semeru" => Semeru::new(options).into(),
            "zulu" => Zulu::new(options).into(),
            "liberica" => Liberica::new(options).into(),
            "microsoft" => Microsoft::new(options).into(),
            "corretto" => Corretto::new(options).into(),
            "oracle" => Oracle::new(options).into(),
            "graalvm" => GraalVm::new(options).into(),
            "dragonwell" => Dragonwell::new(options).into(),
            "sapmachine" => SapMachine::new(options).into(),
            "jetbrains" => JetBrains::new(options).into(),
            "kona" => Kona::new(options).into(),
            "jdkfile" => LocalDistribution::new(options, jdk_file).into(),
            _ => {
                return Err(user_error(
                    DistributionError::Configuration,
                    format!("No supported distribution was found for input {}", name),
                ))
            }
        };
        Ok(distribution)
    }

    /// `(key, description)` for every name [`Distribution::from_name`] accepts.
    pub fn available() -> &'static [(&'static str, &'static str)] {
        AVAILABLE
    }
}
