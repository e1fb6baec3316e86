//! Artifact categories and per-category name patterns.

use anyhow::Result;

use syntax::Template;

use crate::flags::append_expanded;
use crate::vars::{ExpandError, VarScope};
use crate::decl::ArtifactNamePatternDecl;
use crate::Error;

/// Closed enumeration of artifact kinds, shared with the surrounding
/// build system. Toolchains reference categories by their string name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactCategory {
    StaticLibrary,
    AlwayslinkStaticLibrary,
    DynamicLibrary,
    Executable,
    InterfaceLibrary,
    PicFile,
    IncludedFileList,
    ObjectFile,
    PicObjectFile,
    CppModule,
    GeneratedAssembly,
    ProcessedHeader,
    GeneratedHeader,
    PreprocessedCSource,
    PreprocessedCppSource,
    CoverageDataFile,
}

impl ArtifactCategory {
    const ALL: [ArtifactCategory; 16] = [
        Self::StaticLibrary,
        Self::AlwayslinkStaticLibrary,
        Self::DynamicLibrary,
        Self::Executable,
        Self::InterfaceLibrary,
        Self::PicFile,
        Self::IncludedFileList,
        Self::ObjectFile,
        Self::PicObjectFile,
        Self::CppModule,
        Self::GeneratedAssembly,
        Self::ProcessedHeader,
        Self::GeneratedHeader,
        Self::PreprocessedCSource,
        Self::PreprocessedCppSource,
        Self::CoverageDataFile,
    ];

    pub fn category_name(&self) -> &'static str {
        match self {
            Self::StaticLibrary => "static_library",
            Self::AlwayslinkStaticLibrary => "alwayslink_static_library",
            Self::DynamicLibrary => "dynamic_library",
            Self::Executable => "executable",
            Self::InterfaceLibrary => "interface_library",
            Self::PicFile => "pic_file",
            Self::IncludedFileList => "included_file_list",
            Self::ObjectFile => "object_file",
            Self::PicObjectFile => "pic_object_file",
            Self::CppModule => "cpp_module",
            Self::GeneratedAssembly => "generated_assembly",
            Self::ProcessedHeader => "processed_header",
            Self::GeneratedHeader => "generated_header",
            Self::PreprocessedCSource => "preprocessed_c_source",
            Self::PreprocessedCppSource => "preprocessed_cpp_source",
            Self::CoverageDataFile => "coverage_data_file",
        }
    }

    pub fn from_category_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.category_name() == name)
    }
}

/// How artifacts of one category are named: a template over `output_name`,
/// `base_name`, and `output_directory`.
#[derive(Debug)]
pub(crate) struct ArtifactNamePattern {
    category: ArtifactCategory,
    template: Template,
}

impl ArtifactNamePattern {
    pub(crate) fn from_decl(decl: &ArtifactNamePatternDecl) -> Result<Self> {
        let category = ArtifactCategory::from_category_name(&decl.category_name)
            .ok_or_else(|| Error::UnknownArtifactCategory(decl.category_name.clone()))?;
        Ok(Self {
            category,
            template: syntax::parse(&decl.pattern)?,
        })
    }

    pub(crate) fn category(&self) -> ArtifactCategory {
        self.category
    }

    /// The artifact name this pattern produces for `output_name`. A single
    /// leading '/' is stripped from the expansion.
    pub(crate) fn expand(&self, output_name: &str) -> Result<String, ExpandError> {
        let (output_directory, base_name) = match output_name.rfind('/') {
            Some(i) => (&output_name[..i], &output_name[i + 1..]),
            None => ("", output_name),
        };
        let scope = VarScope::builder()
            .strings([
                ("output_name", output_name),
                ("base_name", base_name),
                ("output_directory", output_directory),
            ])
            .build();

        let mut name = String::new();
        append_expanded(&self.template, &scope, &mut name)?;
        if let Some(stripped) = name.strip_prefix('/') {
            return Ok(stripped.to_owned());
        }
        Ok(name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn pattern(category_name: &str, pattern: &str) -> ArtifactNamePattern {
        ArtifactNamePattern::from_decl(&ArtifactNamePatternDecl {
            category_name: category_name.into(),
            pattern: pattern.into(),
        })
        .unwrap()
    }

    #[test]
    fn test_category_names_round_trip() {
        for category in ArtifactCategory::ALL {
            assert_eq!(
                Some(category),
                ArtifactCategory::from_category_name(category.category_name())
            );
        }
        assert!(ArtifactCategory::from_category_name("no_such_category").is_none());
    }

    #[test]
    fn test_static_library_name() {
        let p = pattern("static_library", "lib%{base_name}.a");
        assert_eq!("libfoo.a", p.expand("x/foo").unwrap());
        assert_eq!("libfoo.a", p.expand("foo").unwrap());
    }

    #[test]
    fn test_directory_pattern_strips_leading_slash() {
        let p = pattern("object_file", "%{output_directory}/%{base_name}.o");
        assert_eq!("x/y/foo.o", p.expand("x/y/foo").unwrap());
        // no directory: the leading separator goes away
        assert_eq!("foo.o", p.expand("foo").unwrap());
    }

    #[test]
    fn test_unknown_category_rejected() {
        let res = ArtifactNamePattern::from_decl(&ArtifactNamePatternDecl {
            category_name: "mystery".into(),
            pattern: "%{base_name}".into(),
        });
        assert!(res.is_err());
    }
}
