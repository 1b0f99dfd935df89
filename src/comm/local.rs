use super::{max_propagating_nan, Communicator, FileRegion, Tag};
use crate::error::{Error, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

#[derive(Debug)]
struct Message {
    tag: Tag,
    payload: Vec<f64>,
}

#[derive(Debug)]
pub struct LocalComm {
    rank: usize,
    size: usize,
    // Indexed by destination rank.
    senders: Vec<Option<Sender<Message>>>,
    // Indexed by source rank.
    receivers: Vec<Option<Receiver<Message>>>,
}

// Zero-capacity links: a send completes only once the peer has received it,
// and fails once the peer has dropped its end.
pub fn world(size: usize) -> Vec<LocalComm> {
    let mut senders: Vec<Vec<Option<Sender<Message>>>> =
        (0..size).map(|_| (0..size).map(|_| None).collect()).collect();
    let mut receivers: Vec<Vec<Option<Receiver<Message>>>> =
        (0..size).map(|_| (0..size).map(|_| None).collect()).collect();

    for src in 0..size {
        for dst in 0..size {
            if src != dst {
                let (tx, rx) = bounded(0);
                senders[src][dst] = Some(tx);
                receivers[dst][src] = Some(rx);
            }
        }
    }

    senders
        .into_iter()
        .zip(receivers)
        .enumerate()
        .map(|(rank, (senders, receivers))| LocalComm {
            rank,
            size,
            senders,
            receivers,
        })
        .collect()
}

/// Run `worker` on `size` threads, one communicator each, and return every
/// worker's result in rank order.
pub fn launch<T, F>(size: usize, worker: F) -> Vec<Result<T>>
where
    T: Send,
    F: Fn(LocalComm) -> Result<T> + Sync,
{
    let comms = world(size);
    std::thread::scope(|scope| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                let rank = comm.rank;
                let worker = &worker;
                std::thread::Builder::new()
                    .name(format!("worker-{}", rank))
                    .spawn_scoped(scope, move || {
                        let _span = tracing::info_span!("worker", rank).entered();
                        worker(comm)
                    })
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(rank, handle)| match handle {
                Ok(handle) => handle
                    .join()
                    .unwrap_or_else(|_| Err(Error::communication(rank, "worker panicked"))),
                Err(e) => Err(Error::Io(e)),
            })
            .collect()
    })
}

/// Collapse per-worker results. On failure the returned error is the root
/// cause rather than one of the peer-disconnect errors it triggered.
pub fn collect<T>(results: Vec<Result<T>>) -> Result<Vec<T>> {
    let mut values = Vec::with_capacity(results.len());
    let mut first_error: Option<Error> = None;
    for result in results {
        match result {
            Ok(value) => values.push(value),
            Err(e) => {
                let replace = match &first_error {
                    None => true,
                    Some(current) => current.is_peer_failure() && !e.is_peer_failure(),
                };
                if replace {
                    first_error = Some(e);
                }
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(values),
    }
}

impl LocalComm {
    fn send(&self, dest: usize, tag: Tag, payload: Vec<f64>) -> Result<()> {
        let sender = self
            .senders
            .get(dest)
            .and_then(Option::as_ref)
            .ok_or_else(|| Error::communication(self.rank, &format!("no link to rank {}", dest)))?;
        sender.send(Message { tag, payload }).map_err(|_| {
            Error::communication(self.rank, &format!("rank {} left before receiving", dest))
        })
    }

    fn recv(&self, src: usize, tag: Tag) -> Result<Vec<f64>> {
        let receiver = self
            .receivers
            .get(src)
            .and_then(Option::as_ref)
            .ok_or_else(|| Error::communication(self.rank, &format!("no link from rank {}", src)))?;
        let message = receiver.recv().map_err(|_| {
            Error::communication(self.rank, &format!("rank {} left before sending", src))
        })?;
        if message.tag != tag {
            return Err(Error::communication(
                self.rank,
                &format!(
                    "expected {:?} from rank {}, got {:?}",
                    tag, src, message.tag
                ),
            ));
        }
        Ok(message.payload)
    }

    fn recv_into(&self, src: usize, tag: Tag, buf: &mut [f64]) -> Result<()> {
        let payload = self.recv(src, tag)?;
        if payload.len() != buf.len() {
            return Err(Error::communication(
                self.rank,
                &format!(
                    "rank {} sent {} values, expected {}",
                    src,
                    payload.len(),
                    buf.len()
                ),
            ));
        }
        buf.copy_from_slice(&payload);
        Ok(())
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send_receive(
        &self,
        peer: usize,
        send_tag: Tag,
        send: &[f64],
        recv_tag: Tag,
        recv: &mut [f64],
    ) -> Result<()> {
        if peer == self.rank {
            recv.copy_from_slice(send);
            return Ok(());
        }
        // Lower rank sends first so the rendezvous pair always matches.
        if self.rank < peer {
            self.send(peer, send_tag, send.to_vec())?;
            self.recv_into(peer, recv_tag, recv)
        } else {
            self.recv_into(peer, recv_tag, recv)?;
            self.send(peer, send_tag, send.to_vec())
        }
    }

    fn broadcast(&self, root: usize, buf: &mut [f64]) -> Result<()> {
        if self.rank == root {
            for dest in (0..self.size).filter(|&r| r != root) {
                self.send(dest, Tag::Broadcast, buf.to_vec())?;
            }
            Ok(())
        } else {
            self.recv_into(root, Tag::Broadcast, buf)
        }
    }

    fn barrier(&self) -> Result<()> {
        if self.rank == 0 {
            for src in 1..self.size {
                self.recv(src, Tag::Barrier)?;
            }
            for dest in 1..self.size {
                self.send(dest, Tag::Barrier, Vec::new())?;
            }
            Ok(())
        } else {
            self.send(0, Tag::Barrier, Vec::new())?;
            self.recv(0, Tag::Barrier).map(|_| ())
        }
    }

    fn all_reduce_max(&self, local: f64) -> Result<f64> {
        let mut value = [local];
        if self.rank == 0 {
            for src in 1..self.size {
                let mut other = [0.0];
                self.recv_into(src, Tag::Reduce, &mut other)?;
                value[0] = max_propagating_nan(value[0], other[0]);
            }
        } else {
            self.send(0, Tag::Reduce, value.to_vec())?;
        }
        self.broadcast(0, &mut value)?;
        Ok(value[0])
    }

    fn write_at_all(&self, path: &Path, region: &FileRegion, data: &[f64]) -> Result<()> {
        if data.len() != region.len() {
            return Err(Error::InvalidParameters(format!(
                "snapshot region holds {} values, got {}",
                region.len(),
                data.len()
            )));
        }
        if self.rank == 0 {
            let file = File::create(path)?;
            file.set_len(region.file_bytes())?;
        }
        self.barrier()?;

        if !region.is_empty() {
            let mut file = OpenOptions::new().write(true).open(path)?;
            let row_len = region.local[1];
            for (i, row) in data.chunks_exact(row_len).enumerate() {
                file.seek(SeekFrom::Start(region.row_byte_offset(i)))?;
                file.write_all(bytemuck::cast_slice(row))?;
            }
            file.flush()?;
        }

        self.barrier()
    }
}
