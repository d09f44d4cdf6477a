//! Recipe extractors
//!
//! Each extractor answers one question about the probe build by identifying
//! the relevant invocation line and partitioning its tokens:
//!
//! - [`build_tokens`] / [`compile_recipe`]: compiler, flags and include paths
//!   per source kind
//! - [`link_tokens`]: linker, flags, objects and libraries of the final link
//! - [`archive_tokens`]: archiver and flags used to build `core.a`
//! - [`post_link_lines`]: steps replayed verbatim after linking
//! - [`sketch_cache`]: scratch directory arduino-cli builds into

use super::error::{MinerError, Result};
use super::filter::{
    Chain, FlagSpec, FlagTable, PassAll, PatternSet, TokenFilter, TokenPredicate,
};
use super::sort::sort_line;
use super::stages::{identify_line, BuildStages};
use super::tokenize::split_line;
use super::types::{Source, SourceMap, Stage};
use crate::util::text::string_dictionary_of_list;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const INCLUDE_FLAG: &str = "-I";
const CORE_ARCHIVE: &str = "core.a";
const OBJECT_PATTERNS: [&str; 1] = [r"\.o$"];
const LIBRARY_PATTERNS: [&str; 4] = [r"\.a$", r"^-l", "--start-group$", "--end-group$"];

/// How one source kind is compiled
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileRecipe {
    pub tool: String,
    pub flags: Vec<String>,
    pub include_paths: Vec<String>,
}

/// How the final executable is linked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRecipe {
    pub linker: String,
    pub flags: Vec<String>,
    pub objects: Vec<String>,
    pub libraries: Vec<String>,
}

/// How the core archive is assembled
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveRecipe {
    pub archiver: String,
    pub flags: Vec<String>,
}

/// Filters shared by every compile-line extraction of one run
struct CompileFilters {
    compile_flags: FlagTable,
    source_names: PatternSet,
    include_flags: FlagTable,
}

impl CompileFilters {
    fn new(sources: &SourceMap) -> Result<Self> {
        Ok(Self {
            compile_flags: FlagTable::new([
                ("-c", FlagSpec::NeverTakesArgument),
                ("-o", FlagSpec::AlwaysTakesArgument),
            ])?,
            source_names: PatternSet::literals(sources.real_names())?,
            include_flags: FlagTable::new([(
                INCLUDE_FLAG,
                FlagSpec::ConditionalOnPreviousToken(TokenPredicate::Exactly(
                    INCLUDE_FLAG.to_string(),
                )),
            )])?,
        })
    }

    fn recipe(
        &self,
        stages: &BuildStages,
        sources: &SourceMap,
        source: Source,
    ) -> Result<CompileRecipe> {
        // The file name must end a token, not prefix a sibling's name; arduino-cli
        // quotes paths so a closing quote also ends it
        let matcher = PatternSet::new([format!(
            r#"{}(\s|["']|$)"#,
            regex::escape(&sources.real_name(source))
        )])?;
        let line = identify_line(Stage::Compilation, stages, &matcher, true)?;

        let cleaner = Chain::new(&self.compile_flags, &self.source_names);
        let sorted = sort_line(line, &cleaner, &self.include_flags)?;

        let include_paths = sorted
            .dropped
            .iter()
            .filter(|token| *token != INCLUDE_FLAG)
            .map(|token| token.strip_prefix(INCLUDE_FLAG).unwrap_or(token).to_string())
            .collect();

        Ok(CompileRecipe {
            tool: sorted.head,
            flags: sorted.kept,
            include_paths,
        })
    }
}

/// Compile recipe for a single source kind
pub fn compile_recipe(
    stages: &BuildStages,
    sources: &SourceMap,
    source: Source,
) -> Result<CompileRecipe> {
    CompileFilters::new(sources)?.recipe(stages, sources, source)
}

/// Compile recipes for every source kind
pub fn build_tokens(
    stages: &BuildStages,
    sources: &SourceMap,
) -> Result<BTreeMap<Source, CompileRecipe>> {
    let filters = CompileFilters::new(sources)?;
    let recipes = Source::ALL
        .iter()
        .map(|source| -> Result<(Source, CompileRecipe)> {
            Ok((*source, filters.recipe(stages, sources, *source)?))
        })
        .collect::<Result<BTreeMap<_, _>>>()?;

    let tools: BTreeMap<Source, Vec<String>> = recipes
        .iter()
        .map(|(source, recipe)| (*source, vec![recipe.tool.clone()]))
        .collect();
    let include_paths: BTreeMap<Source, Vec<String>> = recipes
        .iter()
        .map(|(source, recipe)| (*source, recipe.include_paths.clone()))
        .collect();
    let flags: BTreeMap<Source, Vec<String>> = recipes
        .iter()
        .map(|(source, recipe)| (*source, recipe.flags.clone()))
        .collect();
    debug!("Detected compilers:{}", string_dictionary_of_list(&tools, 1));
    debug!("Detected include paths:{}", string_dictionary_of_list(&include_paths, 1));
    debug!("Detected build flags:{}", string_dictionary_of_list(&flags, 1));

    Ok(recipes)
}

/// The final link: the only link-stage line naming every probe object
pub fn identify_link_line<'a>(stages: &'a BuildStages, object_names: &[String]) -> Result<&'a str> {
    let line = identify_line(
        Stage::Link,
        stages,
        &PatternSet::literals(object_names)?,
        true,
    )?;
    debug!("Linking line: {}", line);
    Ok(line)
}

/// Linker, flags, extra objects and libraries of the final link
pub fn link_tokens(stages: &BuildStages, sources: &SourceMap) -> Result<LinkRecipe> {
    let object_names = sources.object_names();
    let link_line = identify_link_line(stages, &object_names)?;

    let output_flag = FlagTable::new([("-o", FlagSpec::AlwaysTakesArgument)])?;
    let probe_objects = PatternSet::literals(&object_names)?;
    let cleaner = Chain::new(&output_flag, &probe_objects);
    let linkables = PatternSet::new(OBJECT_PATTERNS.iter().chain(LIBRARY_PATTERNS.iter()))?;

    let sorted = sort_line(link_line, &cleaner, &linkables)?;
    let objects = PatternSet::new(OBJECT_PATTERNS)?;
    let libraries = PatternSet::new(LIBRARY_PATTERNS)?;

    let recipe = LinkRecipe {
        linker: sorted.head,
        flags: sorted.kept,
        objects: objects.apply(&sorted.dropped, true),
        libraries: libraries.apply(&sorted.dropped, true),
    };

    debug!("Detected linker: {}", recipe.linker);
    debug!("Detected linker flags:\n\t{}", recipe.flags.join("\n\t"));
    debug!("Detected link libraries:\n\t{}", recipe.libraries.join("\n\t"));
    debug!("Detected link objects:\n\t{}", recipe.objects.join("\n\t"));
    Ok(recipe)
}

/// A core-stage line writing `core.a`.
///
/// arduino-cli archives each core object with its own call, so several lines
/// match and the first one is taken.
pub fn identify_archive_line(stages: &BuildStages) -> Result<&str> {
    let line = identify_line(Stage::Core, stages, &PatternSet::new([r"core\.a"])?, false)?;
    debug!("Archive line: {}", line);
    Ok(line)
}

/// Archiver and flags used to build the core archive
pub fn archive_tokens(stages: &BuildStages) -> Result<ArchiveRecipe> {
    let archive_line = identify_archive_line(stages)?;
    let cleaner = PatternSet::new([r"core\.a", r"\.o"])?;
    let sorted = sort_line(archive_line, &cleaner, &PassAll)?;

    if !sorted.dropped.is_empty() {
        return Err(MinerError::shape(
            "archive line",
            format!("unsorted tokens left over: {}", sorted.dropped.join(" ")),
        ));
    }

    debug!("Detected archive tool: {}", sorted.head);
    debug!("Detected archive flags:\n\t{}", sorted.kept.join("\n\t"));
    Ok(ArchiveRecipe {
        archiver: sorted.head,
        flags: sorted.kept,
    })
}

/// Link-stage lines following the final link, replayed unmodified
pub fn post_link_lines(stages: &BuildStages, sources: &SourceMap) -> Result<Vec<String>> {
    let link_line = identify_link_line(stages, &sources.object_names())?;
    let stage_lines = stages.lines(Stage::Link);
    let post_links = stage_lines
        .iter()
        .position(|line| line == link_line)
        .map(|index| stage_lines[index + 1..].to_vec())
        .unwrap_or_default();

    debug!("Post link steps:\n\t{}", post_links.join("\n\t"));
    Ok(post_links)
}

/// Scratch directory arduino-cli builds into: the grandparent of the core
/// archive named by the last core-stage line that writes it
pub fn sketch_cache(stages: &BuildStages) -> Result<PathBuf> {
    let core_lines = stages.lines(Stage::Core);
    if core_lines.is_empty() {
        return Err(MinerError::MissingStage(Stage::Core));
    }

    let mut core_archive = None;
    for line in core_lines.iter().rev() {
        if let Some(token) = split_line(line)?
            .into_iter()
            .find(|token| token.ends_with(CORE_ARCHIVE))
        {
            core_archive = Some(token);
            break;
        }
    }
    let core_archive = core_archive
        .ok_or_else(|| MinerError::shape("core stage", "could not find core.a"))?;

    let cache = Path::new(&core_archive)
        .parent()
        .and_then(Path::parent)
        .filter(|cache| !cache.as_os_str().is_empty())
        .ok_or_else(|| {
            MinerError::shape(
                "core archive",
                format!("'{}' has no enclosing build directory", core_archive),
            )
        })?
        .to_path_buf();

    debug!("Found Arduino sketch cache: {}", cache.display());
    Ok(cache)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| line.to_string()).collect()
    }

    fn sources() -> SourceMap {
        SourceMap::new(Path::new("/tmp/special_input_file"), "special_input_file")
    }

    fn sketch_sources() -> SourceMap {
        SourceMap::new(Path::new("/tmp/sketch"), "sketch")
    }

    fn link_stages() -> BuildStages {
        [(
            Stage::Link,
            owned(&[
                "avr-gcc -o sketch.ino.elf sketch.c.o sketch.cpp.o sketch.S.o sketch.ino.cpp.o a.o b.o core.a -lm --start-group --end-group",
                "avr-objcopy -O ihex -R .eeprom sketch.ino.elf sketch.hex",
            ]),
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_compile_recipe_splits_include_paths() {
        let stages: BuildStages = [(
            Stage::Compilation,
            owned(&["avr-gcc -c -o special_input_file.c.o -Iinclude1 -Iinclude2 special_input_file.c"]),
        )]
        .into_iter()
        .collect();

        let recipe = compile_recipe(&stages, &sources(), Source::C).unwrap();
        assert_eq!(recipe.tool, "avr-gcc");
        assert_eq!(recipe.include_paths, vec!["include1", "include2"]);
        assert!(recipe.flags.is_empty());
    }

    #[test]
    fn test_compile_recipe_handles_separate_include_argument() {
        let stages: BuildStages = [(
            Stage::Compilation,
            owned(&["g++ -c -Os -I /opt/inc -Ilocal -DX=1 /b/special_input_file.cpp -o /b/special_input_file.cpp.o"]),
        )]
        .into_iter()
        .collect();

        let recipe = compile_recipe(&stages, &sources(), Source::Cpp).unwrap();
        assert_eq!(recipe.tool, "g++");
        assert_eq!(recipe.flags, vec!["-Os", "-DX=1"]);
        assert_eq!(recipe.include_paths, vec!["/opt/inc", "local"]);
    }

    #[test]
    fn test_compile_line_requires_whole_file_name() {
        // special_input_file.c is a prefix of special_input_file.cpp
        let stages: BuildStages = [(
            Stage::Compilation,
            owned(&[
                "gcc -c special_input_file.c -o special_input_file.c.o",
                "g++ -c special_input_file.cpp -o special_input_file.cpp.o",
            ]),
        )]
        .into_iter()
        .collect();

        assert_eq!(compile_recipe(&stages, &sources(), Source::C).unwrap().tool, "gcc");
        assert_eq!(compile_recipe(&stages, &sources(), Source::Cpp).unwrap().tool, "g++");
    }

    #[test]
    fn test_compile_recipe_for_entry_point_uses_wrapped_name() {
        let stages: BuildStages = [(
            Stage::Compilation,
            owned(&["g++ -c -flto special_input_file.ino.cpp -o special_input_file.ino.cpp.o"]),
        )]
        .into_iter()
        .collect();

        let recipe = compile_recipe(&stages, &sources(), Source::Ino).unwrap();
        assert_eq!(recipe.flags, vec!["-flto"]);
    }

    #[test]
    fn test_compile_recipe_from_quoted_paths() {
        let stages: BuildStages = [(
            Stage::Compilation,
            owned(&[
                r#""/opt/avr/bin/avr-gcc" -c -Os "-I/opt/core" "/b/sketch/special_input_file.c" -o "/b/sketch/special_input_file.c.o""#,
                r#""/opt/avr/bin/avr-g++" -c -Os "/b/sketch/special_input_file.cpp" -o "/b/sketch/special_input_file.cpp.o""#,
            ]),
        )]
        .into_iter()
        .collect();

        let recipe = compile_recipe(&stages, &sources(), Source::C).unwrap();
        assert_eq!(recipe.tool, "/opt/avr/bin/avr-gcc");
        assert_eq!(recipe.flags, vec!["-Os"]);
        assert_eq!(recipe.include_paths, vec!["/opt/core"]);
    }

    #[test]
    fn test_duplicate_compile_lines_are_ambiguous() {
        let stages: BuildStages = [(
            Stage::Compilation,
            owned(&[
                "gcc -c special_input_file.c -o special_input_file.c.o",
                "clang -c special_input_file.c -o special_input_file.c.o",
            ]),
        )]
        .into_iter()
        .collect();

        assert!(matches!(
            compile_recipe(&stages, &sources(), Source::C),
            Err(MinerError::AmbiguousInvocation { .. })
        ));
    }

    #[test]
    fn test_build_tokens_needs_every_source() {
        let stages: BuildStages = [(
            Stage::Compilation,
            owned(&["gcc -c special_input_file.c -o special_input_file.c.o"]),
        )]
        .into_iter()
        .collect();

        assert!(matches!(
            build_tokens(&stages, &sources()),
            Err(MinerError::MissingStage(Stage::Compilation))
        ));
    }

    #[test]
    fn test_link_recipe() {
        let recipe = link_tokens(&link_stages(), &sketch_sources()).unwrap();
        assert_eq!(recipe.linker, "avr-gcc");
        assert!(recipe.flags.is_empty());
        assert_eq!(recipe.objects, vec!["a.o", "b.o"]);
        assert_eq!(
            recipe.libraries,
            vec!["core.a", "-lm", "--start-group", "--end-group"]
        );
    }

    #[test]
    fn test_link_recipe_keeps_flags() {
        let stages: BuildStages = [(
            Stage::Link,
            owned(&["gcc -Os -Wl,--gc-sections -o x.elf sketch.c.o sketch.cpp.o sketch.S.o sketch.ino.cpp.o -L/tmp/build -lm"]),
        )]
        .into_iter()
        .collect();

        let recipe = link_tokens(&stages, &sketch_sources()).unwrap();
        assert_eq!(recipe.flags, vec!["-Os", "-Wl,--gc-sections", "-L/tmp/build"]);
        assert!(recipe.objects.is_empty());
        assert_eq!(recipe.libraries, vec!["-lm"]);
    }

    #[test]
    fn test_post_link_lines() {
        assert_eq!(
            post_link_lines(&link_stages(), &sketch_sources()).unwrap(),
            owned(&["avr-objcopy -O ihex -R .eeprom sketch.ino.elf sketch.hex"])
        );
    }

    #[test]
    fn test_partial_link_is_not_the_final_link() {
        let mut stages = link_stages();
        stages.insert(Stage::Link, owned(&["avr-ld -r -o part.o sketch.c.o"]));
        assert_eq!(link_tokens(&stages, &sketch_sources()).unwrap().linker, "avr-gcc");
    }

    #[test]
    fn test_missing_link_stage() {
        let stages: BuildStages = [(Stage::Compilation, owned(&["gcc -c x.c"]))]
            .into_iter()
            .collect();
        assert!(matches!(
            link_tokens(&stages, &sketch_sources()),
            Err(MinerError::MissingStage(Stage::Link))
        ));
        assert!(matches!(
            post_link_lines(&stages, &sketch_sources()),
            Err(MinerError::MissingStage(Stage::Link))
        ));
    }

    fn core_stages() -> BuildStages {
        [(
            Stage::Core,
            owned(&[
                "avr-gcc -c wiring.c -o /tmp/build/core/wiring.c.o",
                "avr-gcc-ar rcs /tmp/build/core/core.a /tmp/build/core/wiring.c.o",
                "avr-gcc-ar rcs /tmp/build/core/core.a /tmp/build/core/main.cpp.o",
            ]),
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_archive_recipe() {
        let recipe = archive_tokens(&core_stages()).unwrap();
        assert_eq!(recipe.archiver, "avr-gcc-ar");
        assert_eq!(recipe.flags, vec!["rcs"]);
    }

    #[test]
    fn test_archiver_path_resembling_object_is_kept() {
        let stages: BuildStages = [(
            Stage::Core,
            owned(&[r#""/home/john.owens/.arduino15/bin/avr-gcc-ar" rcs "/tmp/b/core/core.a" "/tmp/b/core/wiring.c.o""#]),
        )]
        .into_iter()
        .collect();

        let recipe = archive_tokens(&stages).unwrap();
        assert_eq!(recipe.archiver, "/home/john.owens/.arduino15/bin/avr-gcc-ar");
        assert_eq!(recipe.flags, vec!["rcs"]);
    }

    #[test]
    fn test_archive_line_is_first_match() {
        assert_eq!(
            identify_archive_line(&core_stages()).unwrap(),
            "avr-gcc-ar rcs /tmp/build/core/core.a /tmp/build/core/wiring.c.o"
        );
    }

    #[test]
    fn test_sketch_cache_is_archive_grandparent() {
        assert_eq!(sketch_cache(&core_stages()).unwrap(), PathBuf::from("/tmp/build"));
    }

    #[test]
    fn test_sketch_cache_skips_trailing_lines_without_archive() {
        let mut stages = core_stages();
        stages.insert(Stage::Core, owned(&["cp /tmp/build/core/other.a /tmp/cache"]));
        assert_eq!(sketch_cache(&stages).unwrap(), PathBuf::from("/tmp/build"));
    }

    #[test]
    fn test_sketch_cache_without_core_stage() {
        assert!(matches!(
            sketch_cache(&BuildStages::default()),
            Err(MinerError::MissingStage(Stage::Core))
        ));
    }

    #[test]
    fn test_sketch_cache_relative_archive_has_no_cache() {
        let stages: BuildStages = [(Stage::Core, owned(&["ar rcs core.a x.o"]))]
            .into_iter()
            .collect();
        assert!(matches!(
            sketch_cache(&stages),
            Err(MinerError::UnexpectedShape { .. })
        ));
    }
}
