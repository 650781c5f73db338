use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Languages, frameworks and tools detected in a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TechProfile {
    pub languages: BTreeSet<String>,
    pub frameworks: BTreeSet<String>,
    pub tools: BTreeSet<String>,
    pub primary_language: Option<String>,
    pub package_manager: Option<String>,
    pub build_system: Option<String>,
}

/// The fixed set of workflow commands a repository can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandRole {
    Build,
    Test,
    Lint,
    Dev,
    TypeCheck,
    Format,
    Deploy,
    Train,
}

impl CommandRole {
    pub const ALL: [CommandRole; 8] = [
        CommandRole::Build,
        CommandRole::Test,
        CommandRole::Lint,
        CommandRole::Dev,
        CommandRole::TypeCheck,
        CommandRole::Format,
        CommandRole::Deploy,
        CommandRole::Train,
    ];

    pub fn key(self) -> &'static str {
        match self {
            CommandRole::Build => "build",
            CommandRole::Test => "test",
            CommandRole::Lint => "lint",
            CommandRole::Dev => "dev",
            CommandRole::TypeCheck => "type_check",
            CommandRole::Format => "format",
            CommandRole::Deploy => "deploy",
            CommandRole::Train => "train",
        }
    }
}

/// Commands per role. The first non-empty command offered for a role is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectedCommands {
    commands: BTreeMap<CommandRole, String>,
}

impl DetectedCommands {
    /// Record `command` for `role` unless the role is already populated.
    /// Returns whether the command was taken.
    pub fn offer(&mut self, role: CommandRole, command: &str) -> bool {
        let command = command.trim();
        if command.is_empty() || self.commands.contains_key(&role) {
            return false;
        }
        self.commands.insert(role, command.to_string());
        true
    }

    pub fn get(&self, role: CommandRole) -> Option<&str> {
        self.commands.get(&role).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Every role in declaration order, populated or not.
    pub fn iter(&self) -> impl Iterator<Item = (CommandRole, Option<&str>)> + '_ {
        CommandRole::ALL.into_iter().map(|role| (role, self.get(role)))
    }
}

impl Serialize for DetectedCommands {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(CommandRole::ALL.len()))?;
        for (role, command) in self.iter() {
            map.serialize_entry(role.key(), &command)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryRole {
    Source,
    Test,
    Docs,
    Config,
    Api,
    Models,
    Data,
}

impl DirectoryRole {
    pub const ALL: [DirectoryRole; 7] = [
        DirectoryRole::Source,
        DirectoryRole::Test,
        DirectoryRole::Docs,
        DirectoryRole::Config,
        DirectoryRole::Api,
        DirectoryRole::Models,
        DirectoryRole::Data,
    ];

    pub fn key(self) -> &'static str {
        match self {
            DirectoryRole::Source => "source",
            DirectoryRole::Test => "test",
            DirectoryRole::Docs => "docs",
            DirectoryRole::Config => "config",
            DirectoryRole::Api => "api",
            DirectoryRole::Models => "models",
            DirectoryRole::Data => "data",
        }
    }
}

/// At most one root-relative path per directory role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryStructure {
    dirs: BTreeMap<DirectoryRole, String>,
}

impl DirectoryStructure {
    pub fn set_if_absent(&mut self, role: DirectoryRole, path: &str) -> bool {
        if self.dirs.contains_key(&role) {
            return false;
        }
        self.dirs.insert(role, path.to_string());
        true
    }

    pub fn get(&self, role: DirectoryRole) -> Option<&str> {
        self.dirs.get(&role).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DirectoryRole, Option<&str>)> + '_ {
        DirectoryRole::ALL.into_iter().map(|role| (role, self.get(role)))
    }
}

impl Serialize for DirectoryStructure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(DirectoryRole::ALL.len()))?;
        for (role, path) in self.iter() {
            map.serialize_entry(role.key(), &path)?;
        }
        map.end()
    }
}

/// Coarse single-winner classification, listed in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Ml,
    Api,
    Mobile,
    Frontend,
    Library,
    #[default]
    General,
}

impl ProjectType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectType::Ml => "ml",
            ProjectType::Api => "api",
            ProjectType::Mobile => "mobile",
            ProjectType::Frontend => "frontend",
            ProjectType::Library => "library",
            ProjectType::General => "general",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the scanner learned about a repository. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectContext {
    pub project_name: String,
    pub tech_stack: TechProfile,
    pub commands: DetectedCommands,
    pub directories: DirectoryStructure,
    pub project_type: ProjectType,
    pub has_ci: bool,
    pub has_container: bool,
}
