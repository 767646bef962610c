//! 按优先级分区的有界缓冲区
//!
//! 所有优先级共享总容量。已取出但尚未完成的事件（in-flight）仍然占用容量，
//! 直到调度器在处理结束后调用 [`PriorityBuffer::remove`]。

use std::collections::{BTreeMap, HashSet};

use tokio::sync::{Mutex, Notify};
use tracing::debug;

use queuing_core::{Incident, IncidentKey, Priority, QueueError, QueueResult};

#[derive(Debug, Default)]
struct BufferState {
    /// 只保存非空分区
    partitions: BTreeMap<Priority, Vec<Incident>>,
    in_flight: HashSet<IncidentKey>,
    pending: usize,
}

impl BufferState {
    fn occupied(&self) -> usize {
        self.pending + self.in_flight.len()
    }

    fn push(&mut self, incident: Incident) {
        self.partitions
            .entry(incident.priority)
            .or_default()
            .push(incident);
        self.pending += 1;
    }

    /// 驱逐指定分区中创建时间最早的事件
    fn evict_oldest(&mut self, priority: Priority) -> QueueResult<Incident> {
        let partition = self
            .partitions
            .get_mut(&priority)
            .ok_or(QueueError::NothingToEvict { priority })?;

        let (index, _) = partition
            .iter()
            .enumerate()
            .min_by_key(|(_, incident)| incident.creation_time)
            .ok_or(QueueError::NothingToEvict { priority })?;

        let evicted = partition.remove(index);
        if partition.is_empty() {
            self.partitions.remove(&priority);
        }
        self.pending -= 1;
        Ok(evicted)
    }

    /// 严格低于 `priority` 的最低非空分区
    fn lowest_below(&self, priority: Priority) -> Option<Priority> {
        self.partitions.range(..priority).next().map(|(level, _)| *level)
    }
}

/// 有界优先级缓冲区
#[derive(Debug)]
pub struct PriorityBuffer {
    capacity: usize,
    state: Mutex<BufferState>,
    not_empty: Notify,
}

impl PriorityBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(BufferState::default()),
            not_empty: Notify::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 占用量，包含已取出但未完成的事件
    pub async fn len(&self) -> usize {
        self.state.lock().await.occupied()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// 等待分配的事件数量
    pub async fn pending_len(&self) -> usize {
        self.state.lock().await.pending
    }

    /// 容量未满时放入事件，否则返回 `BufferFull` 且不做任何修改
    pub async fn try_admit(&self, incident: &Incident) -> QueueResult<()> {
        let mut state = self.state.lock().await;
        if state.occupied() >= self.capacity {
            return Err(QueueError::BufferFull);
        }
        state.push(incident.clone());
        drop(state);

        self.not_empty.notify_one();
        Ok(())
    }

    /// 缓冲区已满时的准入策略，返回被驱逐的事件
    ///
    /// 依次尝试：
    /// 1. 驱逐严格低于新事件优先级的最低非空分区中最早的事件
    /// 2. 驱逐新事件所在分区中最早的事件
    /// 3. 都不可行时返回新事件本身，新事件不会进入缓冲区
    pub async fn evict_and_admit(&self, incident: &Incident) -> Incident {
        let mut state = self.state.lock().await;

        let from_lower = match state.lowest_below(incident.priority) {
            Some(level) => state.evict_oldest(level),
            None => Err(QueueError::NothingToEvict {
                priority: incident.priority,
            }),
        };
        let evicted = match from_lower {
            Ok(evicted) => Ok(evicted),
            Err(QueueError::NothingToEvict { .. }) => state.evict_oldest(incident.priority),
            Err(e) => Err(e),
        };

        match evicted {
            Ok(evicted) => {
                state.push(incident.clone());
                drop(state);
                self.not_empty.notify_one();
                debug!("事件 {} 驱逐了事件 {}", incident, evicted);
                evicted
            }
            Err(_) => {
                debug!("没有可驱逐的事件，拒绝事件 {}", incident);
                incident.clone()
            }
        }
    }

    /// 取出最高优先级分区的全部事件，缓冲区为空时返回空列表
    pub async fn extract_highest_batch(&self) -> Vec<Incident> {
        let mut state = self.state.lock().await;
        let Some((_, batch)) = state.partitions.pop_last() else {
            return Vec::new();
        };

        state.pending -= batch.len();
        state.in_flight.extend(batch.iter().map(Incident::key));
        batch
    }

    /// 等待直到取出一个非空批次
    pub async fn next_batch(&self) -> Vec<Incident> {
        loop {
            let batch = self.extract_highest_batch().await;
            if !batch.is_empty() {
                return batch;
            }
            self.not_empty.notified().await;
        }
    }

    /// 按标识删除事件，无论它仍在分区中还是已被取出
    pub async fn remove(&self, incident: &Incident) -> QueueResult<()> {
        let key = incident.key();
        let mut state = self.state.lock().await;

        if state.in_flight.remove(&key) {
            return Ok(());
        }

        let Some(partition) = state.partitions.get_mut(&key.priority) else {
            return Err(QueueError::not_found(key.id, key.priority));
        };
        let Some(index) = partition.iter().position(|i| i.id == key.id) else {
            return Err(QueueError::not_found(key.id, key.priority));
        };

        partition.remove(index);
        if partition.is_empty() {
            state.partitions.remove(&key.priority);
        }
        state.pending -= 1;
        Ok(())
    }

    /// 清空缓冲区，返回仍在等待分配的事件
    pub async fn clear(&self) -> Vec<Incident> {
        let mut state = self.state.lock().await;
        let partitions = std::mem::take(&mut state.partitions);
        state.in_flight.clear();
        state.pending = 0;
        partitions.into_values().flatten().collect()
    }
}
