use super::VarValue;

/// A file known to the surrounding build system, identified by its
/// execution-root-relative path. A tree artifact stands for a directory of
/// files only enumerable through an [`ArtifactExpander`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    exec_path: String,
    tree: bool,
}

impl Artifact {
    pub fn new(exec_path: impl Into<String>) -> Self {
        Self {
            exec_path: exec_path.into(),
            tree: false,
        }
    }

    pub fn tree(exec_path: impl Into<String>) -> Self {
        Self {
            exec_path: exec_path.into(),
            tree: true,
        }
    }

    pub fn exec_path(&self) -> &str {
        &self.exec_path
    }

    pub fn is_tree(&self) -> bool {
        self.tree
    }
}

/// External collaborator that enumerates the constituent files of a tree
/// artifact. Pure from the engine's perspective; invoked synchronously
/// during expansion.
pub trait ArtifactExpander {
    fn expand(&self, directory: &Artifact, out: &mut Vec<Artifact>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    ObjectFile,
    ObjectFileGroup,
    InterfaceLibrary,
    StaticLibrary,
    DynamicLibrary,
    VersionedDynamicLibrary,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ObjectFile => "object_file",
            Self::ObjectFileGroup => "object_file_group",
            Self::InterfaceLibrary => "interface_library",
            Self::StaticLibrary => "static_library",
            Self::DynamicLibrary => "dynamic_library",
            Self::VersionedDynamicLibrary => "versioned_dynamic_library",
        }
    }
}

/// Specialized structure describing one library on a link line, with
/// fields `name`, `object_files`, `type`, and `is_whole_archive`.
/// `name` is unavailable for object file groups; `object_files` is only
/// available for them, computed from an explicit list or by expanding a
/// tree artifact.
#[derive(Debug, Clone)]
pub struct LibraryToLink {
    name: Option<String>,
    directory: Option<Artifact>,
    object_files: Option<Vec<String>>,
    whole_archive: bool,
    kind: LinkType,
}

impl LibraryToLink {
    pub fn dynamic_library(name: impl Into<String>) -> Self {
        Self::named(name, false, LinkType::DynamicLibrary)
    }

    pub fn versioned_dynamic_library(name: impl Into<String>) -> Self {
        Self::named(name, false, LinkType::VersionedDynamicLibrary)
    }

    pub fn interface_library(name: impl Into<String>) -> Self {
        Self::named(name, false, LinkType::InterfaceLibrary)
    }

    pub fn static_library(name: impl Into<String>, whole_archive: bool) -> Self {
        Self::named(name, whole_archive, LinkType::StaticLibrary)
    }

    pub fn object_file(name: impl Into<String>, whole_archive: bool) -> Self {
        Self::named(name, whole_archive, LinkType::ObjectFile)
    }

    pub fn object_file_group(objects: Vec<String>, whole_archive: bool) -> Self {
        Self {
            name: None,
            directory: None,
            object_files: Some(objects),
            whole_archive,
            kind: LinkType::ObjectFileGroup,
        }
    }

    /// An object file group backed by a tree artifact; its `object_files`
    /// field expands the directory through the artifact expander.
    pub fn object_directory(directory: Artifact, whole_archive: bool) -> Self {
        Self {
            name: None,
            directory: Some(directory),
            object_files: None,
            whole_archive,
            kind: LinkType::ObjectFileGroup,
        }
    }

    fn named(name: impl Into<String>, whole_archive: bool, kind: LinkType) -> Self {
        Self {
            name: Some(name.into()),
            directory: None,
            object_files: None,
            whole_archive,
            kind,
        }
    }

    pub fn kind(&self) -> LinkType {
        self.kind
    }

    pub(crate) fn field(
        &self,
        field: &str,
        expander: Option<&dyn ArtifactExpander>,
    ) -> Option<VarValue> {
        match field {
            "name" if self.kind != LinkType::ObjectFileGroup => {
                self.name.clone().map(VarValue::Str)
            }
            "object_files" if self.kind == LinkType::ObjectFileGroup => {
                Some(VarValue::StringSeq(self.expanded_object_files(expander)))
            }
            "type" => Some(VarValue::Str(self.kind.as_str().to_owned())),
            "is_whole_archive" => Some(VarValue::Integer(i64::from(self.whole_archive))),
            _ => None,
        }
    }

    fn expanded_object_files(&self, expander: Option<&dyn ArtifactExpander>) -> Vec<String> {
        if let Some(objects) = &self.object_files {
            return objects.clone();
        }
        let Some(directory) = &self.directory else {
            return Vec::new();
        };
        match expander {
            Some(expander) => {
                let mut artifacts = Vec::new();
                expander.expand(directory, &mut artifacts);
                artifacts.iter().map(|a| a.exec_path().to_owned()).collect()
            }
            // without an expander, the directory itself stands in:
            None => vec![directory.exec_path().to_owned()],
        }
    }
}
