//! Optional data-parallel entity update
//!
//! Update functions must be order-independent: an entity's update may read
//! only that entity. [`Scoped`] works on cloned chunks and writes results back
//! only if every worker finished, so a crashed worker leaves the originals
//! untouched and the batch is simply rerun sequentially.

/// Applies an update to every item of a slice
pub trait UpdateExecutor {
    fn update_all<T, F>(&self, items: &mut [T], f: F)
    where
        T: Clone + Send,
        F: Fn(&mut T) + Sync;
}

/// In-order, in-place update on the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl UpdateExecutor for Sequential {
    fn update_all<T, F>(&self, items: &mut [T], f: F)
    where
        T: Clone + Send,
        F: Fn(&mut T) + Sync,
    {
        items.iter_mut().for_each(f);
    }
}

/// Scoped worker threads over cloned chunks
#[derive(Debug, Clone, Copy)]
pub struct Scoped {
    pub workers: usize,
    /// Below this many items per worker the batch runs sequentially
    pub min_chunk: usize,
}

impl Scoped {
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            min_chunk: 1,
        }
    }
}

impl UpdateExecutor for Scoped {
    fn update_all<T, F>(&self, items: &mut [T], f: F)
    where
        T: Clone + Send,
        F: Fn(&mut T) + Sync,
    {
        let workers = self.workers.max(1);
        let chunk = items.len().div_ceil(workers).max(self.min_chunk.max(1));
        if workers == 1 || items.len() <= chunk {
            return Sequential.update_all(items, f);
        }

        let update = &f;
        let results: Option<Vec<Vec<T>>> = std::thread::scope(|scope| {
            let handles: Vec<_> = items
                .chunks(chunk)
                .map(|slice| {
                    let mut owned = slice.to_vec();
                    scope.spawn(move || {
                        owned.iter_mut().for_each(update);
                        owned
                    })
                })
                .collect();
            // Join everything before deciding, so no worker is left running
            let joined: Vec<Option<Vec<T>>> =
                handles.into_iter().map(|h| h.join().ok()).collect();
            joined.into_iter().collect()
        });

        match results {
            Some(chunks) => {
                for (slot, value) in items.iter_mut().zip(chunks.into_iter().flatten()) {
                    *slot = value;
                }
            }
            None => {
                log::warn!(
                    "Parallel update of {} items failed, rerunning sequentially",
                    items.len()
                );
                Sequential.update_all(items, f);
            }
        }
    }
}

/// Runtime choice of executor
#[derive(Debug, Clone, Copy, Default)]
pub enum Executor {
    #[default]
    Sequential,
    Scoped(Scoped),
}

impl UpdateExecutor for Executor {
    fn update_all<T, F>(&self, items: &mut [T], f: F)
    where
        T: Clone + Send,
        F: Fn(&mut T) + Sync,
    {
        match self {
            Executor::Sequential => Sequential.update_all(items, f),
            Executor::Scoped(scoped) => scoped.update_all(items, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_matches_sequential() {
        let mut a: Vec<u64> = (0..1000).collect();
        let mut b = a.clone();
        Sequential.update_all(&mut a, |x| *x = *x * 3 + 1);
        Scoped::new(4).update_all(&mut b, |x| *x = *x * 3 + 1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_scoped_small_batch_runs_inline() {
        let mut items = vec![1, 2];
        let scoped = Scoped {
            workers: 8,
            min_chunk: 16,
        };
        scoped.update_all(&mut items, |x| *x += 1);
        assert_eq!(items, vec![2, 3]);
    }

    #[test]
    fn test_worker_failure_falls_back() {
        let mut items: Vec<i32> = (0..64).collect();
        // Worker threads are unnamed; the test thread is not
        Scoped::new(4).update_all(&mut items, |x| {
            if std::thread::current().name().is_none() && *x == 40 {
                panic!("worker crash");
            }
            *x += 100;
        });
        let expected: Vec<i32> = (100..164).collect();
        assert_eq!(items, expected);
    }

    #[test]
    fn test_executor_enum_dispatch() {
        let mut items = vec![1.0f32; 10];
        Executor::Scoped(Scoped::new(2)).update_all(&mut items, |x| *x *= 2.0);
        Executor::default().update_all(&mut items, |x| *x += 1.0);
        assert!(items.iter().all(|&x| x == 3.0));
    }
}
