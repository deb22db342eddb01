//! # Resource Identifiers
//!
//! Every tile, texture or other asset is named by a `kind@namespace:path`
//! triple, for example `tile@builtin:0` or `texture@my_mod:tiles/grass.png`.
//!
//! ## Component Rules
//!
//! - `kind` and `namespace`: non-empty word characters (letters, digits, `_`)
//! - `path`: word segments separated by single `/`, optionally ending in one
//!   `.ext` extension
//!
//! Identifiers are validated once, at construction. After that they are
//! immutable and cheap to clone: the canonical string lives in shared
//! storage, so a 64x64 chunk filled with one identifier holds 4096 pointers
//! to a single allocation.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FormatError;

/// Namespace of everything shipped with the game itself.
pub const BUILTIN_NAMESPACE: &str = "builtin";

/// Path of the placeholder resource of each kind.
pub const DEFAULT_PATH: &str = "default";

/// An immutable, validated `kind@namespace:path` resource key.
///
/// Equality, ordering and hashing are by canonical string, so two
/// identifiers built from the same parts are interchangeable as map keys.
///
/// # Example
///
/// ```
/// use tdmap_world::ResourceId;
///
/// let id = ResourceId::new("tile", "builtin", "grass")?;
/// assert_eq!(id.to_string(), "tile@builtin:grass");
/// assert_eq!(ResourceId::parse("tile@builtin:grass")?, id);
/// # Ok::<(), tdmap_world::FormatError>(())
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId {
    /// `kind@namespace:path`.
    canonical: Arc<str>,
    /// Byte offset of the `@`.
    at: usize,
    /// Byte offset of the `:`.
    colon: usize,
}

impl ResourceId {
    /// Builds an identifier from its three components.
    ///
    /// # Errors
    ///
    /// Returns the first component that breaks its character rules.
    pub fn new(kind: &str, namespace: &str, path: &str) -> Result<Self, FormatError> {
        if !is_word(kind) {
            return Err(FormatError::InvalidKind(kind.to_owned()));
        }
        if !is_word(namespace) {
            return Err(FormatError::InvalidNamespace(namespace.to_owned()));
        }
        if !is_path(path) {
            return Err(FormatError::InvalidPath(path.to_owned()));
        }
        Ok(Self::assemble(kind, namespace, path))
    }

    /// Parses the canonical `kind@namespace:path` form.
    ///
    /// # Errors
    ///
    /// Fails if the separators are missing or out of order, or if any
    /// component is empty or breaks its character rules. Word characters
    /// exclude `@` and `:`, so a second separator always lands in a
    /// component and is rejected there.
    pub fn parse(input: &str) -> Result<Self, FormatError> {
        let missing = || FormatError::MissingSeparator {
            input: input.to_owned(),
        };
        let (kind, rest) = input.split_once('@').ok_or_else(missing)?;
        let (namespace, path) = rest.split_once(':').ok_or_else(missing)?;
        Self::new(kind, namespace, path)
    }

    /// Builds the canonical string without validation.
    ///
    /// Callers guarantee the parts already satisfy the component rules.
    fn assemble(kind: &str, namespace: &str, path: &str) -> Self {
        let canonical: Arc<str> = format!("{kind}@{namespace}:{path}").into();
        Self {
            canonical,
            at: kind.len(),
            colon: kind.len() + 1 + namespace.len(),
        }
    }

    /// The resource kind, e.g. `tile`.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.canonical[..self.at]
    }

    /// The owning namespace (mod name), e.g. `builtin`.
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.canonical[self.at + 1..self.colon]
    }

    /// The path inside the namespace.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        &self.canonical[self.colon + 1..]
    }

    /// The canonical `kind@namespace:path` string.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Returns `(kind, namespace, path)`.
    #[must_use]
    pub fn parts(&self) -> (&str, &str, &str) {
        (self.kind(), self.namespace(), self.path())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResourceId").field(&self.as_str()).finish()
    }
}

impl FromStr for ResourceId {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ResourceId {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for ResourceId {
    type Error = FormatError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.canonical.as_ref().to_owned()
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for ResourceId {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for ResourceId {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A resource kind fixed at the type level.
///
/// Sealed: the set of kinds is closed, and every `KIND` is a valid word.
pub trait ResourceKind: sealed::Sealed + 'static {
    /// The kind component every identifier of this type carries.
    const KIND: &'static str;
}

/// Marker for `tile@...` identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tile {}

impl sealed::Sealed for Tile {}
impl ResourceKind for Tile {
    const KIND: &'static str = "tile";
}

/// Marker for `texture@...` identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Texture {}

impl sealed::Sealed for Texture {}
impl ResourceKind for Texture {
    const KIND: &'static str = "texture";
}

/// A resource identifier whose kind is fixed by `K`.
///
/// Dereferences to the untyped [`ResourceId`].
pub struct TypedResourceId<K: ResourceKind> {
    id: ResourceId,
    kind: PhantomData<fn() -> K>,
}

/// Identifier of a tile type.
pub type TileId = TypedResourceId<Tile>;

/// Identifier of a texture.
pub type TextureId = TypedResourceId<Texture>;

impl<K: ResourceKind> TypedResourceId<K> {
    /// Builds an identifier of kind `K::KIND`.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace or path breaks its character rules.
    pub fn new(namespace: &str, path: &str) -> Result<Self, FormatError> {
        ResourceId::new(K::KIND, namespace, path).map(Self::wrap)
    }

    /// Parses the canonical form and checks the embedded kind.
    ///
    /// # Errors
    ///
    /// Fails like [`ResourceId::parse`], or with
    /// [`FormatError::KindMismatch`] if the kind is not `K::KIND`.
    pub fn parse(input: &str) -> Result<Self, FormatError> {
        ResourceId::parse(input).and_then(Self::try_from)
    }

    #[inline]
    fn wrap(id: ResourceId) -> Self {
        Self {
            id,
            kind: PhantomData,
        }
    }

    /// Borrows the untyped identifier.
    #[inline]
    #[must_use]
    pub const fn as_resource_id(&self) -> &ResourceId {
        &self.id
    }

    /// Drops the type-level kind.
    #[inline]
    #[must_use]
    pub fn into_resource_id(self) -> ResourceId {
        self.id
    }
}

impl<K: ResourceKind> TryFrom<ResourceId> for TypedResourceId<K> {
    type Error = FormatError;

    fn try_from(id: ResourceId) -> Result<Self, Self::Error> {
        if id.kind() == K::KIND {
            Ok(Self::wrap(id))
        } else {
            Err(FormatError::KindMismatch {
                expected: K::KIND,
                found: id.kind().to_owned(),
            })
        }
    }
}

impl<K: ResourceKind> From<TypedResourceId<K>> for ResourceId {
    fn from(id: TypedResourceId<K>) -> Self {
        id.id
    }
}

impl<K: ResourceKind> Deref for TypedResourceId<K> {
    type Target = ResourceId;

    fn deref(&self) -> &ResourceId {
        &self.id
    }
}

/// `K@builtin:default`.
impl<K: ResourceKind> Default for TypedResourceId<K> {
    fn default() -> Self {
        Self::wrap(ResourceId::assemble(K::KIND, BUILTIN_NAMESPACE, DEFAULT_PATH))
    }
}

impl<K: ResourceKind> Clone for TypedResourceId<K> {
    fn clone(&self) -> Self {
        Self::wrap(self.id.clone())
    }
}

impl<K: ResourceKind> PartialEq for TypedResourceId<K> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<K: ResourceKind> Eq for TypedResourceId<K> {}

impl<K: ResourceKind> PartialEq<ResourceId> for TypedResourceId<K> {
    fn eq(&self, other: &ResourceId) -> bool {
        &self.id == other
    }
}

impl<K: ResourceKind> PartialEq<&str> for TypedResourceId<K> {
    fn eq(&self, other: &&str) -> bool {
        self.id.as_str() == *other
    }
}

impl<K: ResourceKind> Hash for TypedResourceId<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<K: ResourceKind> PartialOrd for TypedResourceId<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: ResourceKind> Ord for TypedResourceId<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl<K: ResourceKind> fmt::Display for TypedResourceId<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}

impl<K: ResourceKind> fmt::Debug for TypedResourceId<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedResourceId")
            .field(&self.id.as_str())
            .finish()
    }
}

impl<K: ResourceKind> FromStr for TypedResourceId<K> {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<K: ResourceKind> Serialize for TypedResourceId<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id.as_str())
    }
}

impl<'de, K: ResourceKind> Deserialize<'de> for TypedResourceId<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Word character: letter, digit or underscore (any script).
#[inline]
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Non-empty run of word characters.
#[must_use]
pub fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_word_char)
}

/// `segment(/segment)*(.ext)?` with every segment and the extension
/// non-empty words.
#[must_use]
pub fn is_path(s: &str) -> bool {
    let stem = match s.rsplit_once('.') {
        Some((stem, ext)) if is_word(ext) => stem,
        Some(_) => return false,
        None => s,
    };
    stem.split('/').all(is_word)
}
