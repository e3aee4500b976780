use std::marker::PhantomData;

use crate::resources::handles::Handle;

/// 带代数的对象池
///
/// - 每个 slot 有一个代数，第一次分配时为 1，每次释放加一
/// - free list 是一个栈：最近释放的 slot 最先被复用
/// - 代数即将溢出的 slot 会被永久弃用，因此同一个代数不会被两个对象使用
///
/// 这是唯一能够检测 "通过 handle use-after-free" 的机制。
pub struct Pool<T, Tag> {
    slots: Vec<Option<T>>,
    generations: Vec<u32>,
    free_list: Vec<u32>,
    live_count: usize,

    _tag: PhantomData<fn() -> Tag>,
}

impl<T, Tag> Default for Pool<T, Tag> {
    fn default() -> Self {
        Self::new()
    }
}

// new
impl<T, Tag> Pool<T, Tag> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            live_count: 0,
            _tag: PhantomData,
        }
    }
}

// alloc & free
impl<T, Tag> Pool<T, Tag> {
    /// 将对象放入池中，返回其 handle
    pub fn alloc(&mut self, value: T) -> Handle<Tag> {
        debug_assert_eq!(self.slots.len(), self.generations.len());
        self.live_count += 1;

        if let Some(id) = self.free_list.pop() {
            let slot = &mut self.slots[id as usize];
            debug_assert!(slot.is_none());
            *slot = Some(value);
            return Handle::new(id, self.generations[id as usize]);
        }

        assert!(self.slots.len() < u32::MAX as usize, "Pool is full");
        let id = self.slots.len() as u32;
        self.slots.push(Some(value));
        self.generations.push(1);
        Handle::new(id, 1)
    }

    /// 从池中取出对象
    ///
    /// handle 无效时返回 `None`，池不受影响
    pub fn free(&mut self, handle: Handle<Tag>) -> Option<T> {
        if !self.is_valid(handle) {
            return None;
        }

        let id = handle.id() as usize;
        let value = self.slots[id].take();
        self.live_count -= 1;

        match self.generations[id].checked_add(1) {
            Some(generation) => {
                self.generations[id] = generation;
                self.free_list.push(handle.id());
            }
            None => {
                log::warn!("Pool slot {} exhausted its generations, retiring it", id);
            }
        }

        value
    }
}

// getters
impl<T, Tag> Pool<T, Tag> {
    #[inline]
    pub fn is_valid(&self, handle: Handle<Tag>) -> bool {
        let id = handle.id() as usize;
        id < self.slots.len() && self.generations[id] == handle.generation() && self.slots[id].is_some()
    }

    #[inline]
    pub fn get(&self, handle: Handle<Tag>) -> Option<&T> {
        if !self.is_valid(handle) {
            return None;
        }
        self.slots[handle.id() as usize].as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, handle: Handle<Tag>) -> Option<&mut T> {
        if !self.is_valid(handle) {
            return None;
        }
        self.slots[handle.id() as usize].as_mut()
    }

    /// 存活对象的数量
    #[inline]
    pub fn len(&self) -> usize {
        self.live_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// 所有存活对象的 handle
    pub fn handles(&self) -> impl Iterator<Item = Handle<Tag>> + '_ {
        self.slots
            .iter()
            .zip(self.generations.iter())
            .enumerate()
            .filter(|(_, (slot, _))| slot.is_some())
            .map(|(id, (_, generation))| Handle::new(id as u32, *generation))
    }
}
