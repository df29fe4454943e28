//! Relay Codegen
//!
//! Turns a described model class into a standalone entry-point script:
//! - Class source from a member descriptor (`extract_class_source`)
//! - Type tag to (de)serializer mapping (`SerializationRegistry`)
//! - Script assembly with escaped literals (`ScriptSynthesizer`)

pub mod error;
pub mod literal;
pub mod registry;
pub mod script;
pub mod source;

pub use error::{CodegenError, CodegenResult};
pub use literal::{is_identifier, PyLiteral};
pub use registry::{RegistryBuilder, RegistryEntry, SerializationRegistry, DATAFRAME_TYPE_TAG, DATALOADER_TYPE_TAG};
pub use script::{ScriptRequest, ScriptSynthesizer, SerializedParam, SynthesizedScript, DEFAULT_PREAMBLE, INSTANCE_NAME};
pub use source::{extract_class_source, ClassDescriptor, ClassSource, Inspectable, Member, MemberKind};
