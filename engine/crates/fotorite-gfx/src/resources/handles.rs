use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// 带代数的资源句柄
///
/// - `id` 是 [`Pool`](super::pool::Pool) 中的 slot 下标
/// - `generation` 是分配时该 slot 的代数，slot 每被释放一次代数就加一
/// - `generation == 0` 表示 null handle
///
/// `Tag` 只用于区分不同种类的资源，不会被实例化。
pub struct Handle<Tag> {
    id: u32,
    generation: u32,
    _tag: PhantomData<fn() -> Tag>,
}

// new & getters
impl<Tag> Handle<Tag> {
    #[inline]
    pub(crate) const fn new(id: u32, generation: u32) -> Self {
        Self {
            id,
            generation,
            _tag: PhantomData,
        }
    }

    #[inline]
    pub const fn null() -> Self {
        Self::new(0, 0)
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        self.generation == 0
    }

    #[inline]
    pub const fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

// derive 会给 Tag 加上多余的约束，因此手动实现
impl<Tag> Clone for Handle<Tag> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<Tag> Copy for Handle<Tag> {}
impl<Tag> PartialEq for Handle<Tag> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.generation == other.generation
    }
}
impl<Tag> Eq for Handle<Tag> {}
impl<Tag> Hash for Handle<Tag> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.generation.hash(state);
    }
}
impl<Tag> Default for Handle<Tag> {
    fn default() -> Self {
        Self::null()
    }
}
impl<Tag> std::fmt::Debug for Handle<Tag> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = std::any::type_name::<Tag>().rsplit("::").next().unwrap_or("");
        if self.is_null() {
            write!(f, "{tag}(null)")
        } else {
            write!(f, "{tag}({}v{})", self.id, self.generation)
        }
    }
}

pub enum ShaderTag {}
pub enum BufferTag {}
pub enum ImageTag {}
pub enum SamplerTag {}
pub enum PipelineTag {}
pub enum ContextTag {}

pub type ShaderHandle = Handle<ShaderTag>;
pub type BufferHandle = Handle<BufferTag>;
pub type ImageHandle = Handle<ImageTag>;
pub type SamplerHandle = Handle<SamplerTag>;
pub type PipelineHandle = Handle<PipelineTag>;
pub type ContextHandle = Handle<ContextTag>;
