use thiserror::Error;

use crate::Car;

/// Handle to a car stored in a [`CarArena`]. The generation makes a handle
/// that outlived its car fail lookups instead of aliasing a newer car that
/// reused the slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CarKey {
    index: u32,
    generation: u32,
}

impl CarKey {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn to_u64(&self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }

    pub fn from_u64(value: u64) -> Self {
        Self {
            index: value as u32,
            generation: (value >> 32) as u32,
        }
    }
}

/// Errors that can occur when addressing the arena with a handle
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// The handle's slot has been freed or reused since the handle was issued
    #[error("Car handle {key:?} is stale or was never issued by this arena")]
    StaleKey { key: CarKey },
}

enum Slot {
    Occupied { generation: u32, car: Car },
    Vacant { generation: u32, next_free: Option<u32> },
}

/// Owns every car of a session. Cars never point back at the arena; anything
/// that needs a car holds a [`CarKey`].
pub struct CarArena {
    slots: Vec<Slot>,
    free_head: Option<u32>,
    len: usize,
}

impl Default for CarArena {
    fn default() -> Self {
        Self::new()
    }
}

impl CarArena {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, car: Car) -> CarKey {
        self.len += 1;

        if let Some(index) = self.free_head {
            let slot = &mut self.slots[index as usize];
            let (generation, next_free) = match slot {
                Slot::Vacant {
                    generation,
                    next_free,
                } => (generation.wrapping_add(1), *next_free),
                Slot::Occupied { .. } => unreachable!("free list points at an occupied slot"),
            };
            *slot = Slot::Occupied { generation, car };
            self.free_head = next_free;
            return CarKey { index, generation };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot::Occupied { generation: 0, car });
        CarKey {
            index,
            generation: 0,
        }
    }

    pub fn remove(&mut self, key: &CarKey) -> Result<Car, ArenaError> {
        if self.get(key).is_none() {
            return Err(ArenaError::StaleKey { key: *key });
        }

        let vacant = Slot::Vacant {
            generation: key.generation,
            next_free: self.free_head,
        };
        let old = std::mem::replace(&mut self.slots[key.index as usize], vacant);
        self.free_head = Some(key.index);
        self.len -= 1;

        match old {
            Slot::Occupied { car, .. } => Ok(car),
            Slot::Vacant { .. } => Err(ArenaError::StaleKey { key: *key }),
        }
    }

    pub fn contains_key(&self, key: &CarKey) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &CarKey) -> Option<&Car> {
        match self.slots.get(key.index as usize)? {
            Slot::Occupied { generation, car } if *generation == key.generation => Some(car),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, key: &CarKey) -> Option<&mut Car> {
        match self.slots.get_mut(key.index as usize)? {
            Slot::Occupied { generation, car } if *generation == key.generation => Some(car),
            _ => None,
        }
    }

    pub fn try_get_mut(&mut self, key: &CarKey) -> Result<&mut Car, ArenaError> {
        self.get_mut(key).ok_or(ArenaError::StaleKey { key: *key })
    }

    pub fn iter(&self) -> impl Iterator<Item = (CarKey, &Car)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Slot::Occupied { generation, car } => Some((
                    CarKey {
                        index: index as u32,
                        generation: *generation,
                    },
                    car,
                )),
                Slot::Vacant { .. } => None,
            })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (CarKey, &mut Car)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Slot::Occupied { generation, car } => Some((
                    CarKey {
                        index: index as u32,
                        generation: *generation,
                    },
                    car,
                )),
                Slot::Vacant { .. } => None,
            })
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_head = None;
        self.len = 0;
    }
}
