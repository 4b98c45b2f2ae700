mod candidates;
mod discovery;
mod edges;
mod engine;
mod format;
mod package_roots;
mod parser;
mod resolver;

pub use candidates::CandidateFilter;
pub use edges::{extract_edges, CallGraphEdge, ModifiedSet, NameFilter};
pub use format::{escape_call_text, format_edge, unescape_call_text};
pub use package_roots::PackageRootLocator;
pub use parser::{CallExpr, Import, JavaParser, MethodDecl, Receiver, SourceRange, SourceUnit, TypeDecl};
pub use resolver::{resolve, Resolution, ResolutionContext, ResolvedMethod};

// Export the main engine
pub use engine::Engine;
