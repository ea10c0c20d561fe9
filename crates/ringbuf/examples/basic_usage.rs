//! Several producer threads and one consumer thread sharing a `Ring`,
//! reporting throughput. Spawning threads, owning the backing byte buffer,
//! and reporting are all the caller's job — the ring itself only vends
//! offsets.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use ringbuf_mpsc::{Config, Ring};

struct Storage(Box<[UnsafeCell<u8>]>);
unsafe impl Sync for Storage {}

fn main() {
    println!("ringbuf-mpsc basic usage");
    println!("========================\n");

    const N_PRODUCERS: usize = 4;
    const ITEMS_PER_PRODUCER: u64 = 250_000;
    const SPACE: u32 = 1 << 16;

    let ring = Arc::new(Ring::with_config(Config::new(N_PRODUCERS, SPACE, false)));
    let storage = Arc::new(Storage(
        (0..SPACE).map(|_| UnsafeCell::new(0u8)).collect(),
    ));

    println!("Configuration:");
    println!("  Producers: {N_PRODUCERS}");
    println!("  Items per producer: {ITEMS_PER_PRODUCER}");
    println!("  Ring capacity: {SPACE} bytes\n");

    let start = Instant::now();

    let mut handles = Vec::new();
    for id in 0..N_PRODUCERS {
        let ring = Arc::clone(&ring);
        let storage = Arc::clone(&storage);
        handles.push(thread::spawn(move || {
            for i in 0..ITEMS_PER_PRODUCER {
                loop {
                    if let Some(res) = ring.acquire(8) {
                        // SAFETY: this reservation's [offset, offset+8) is
                        // disjoint from every other outstanding reservation.
                        unsafe {
                            let byte = (id as u64).wrapping_add(i) as u8;
                            for b in 0..8u32 {
                                *storage.0[(res.offset + b) as usize].get() = byte;
                            }
                        }
                        ring.produce(res);
                        break;
                    }
                    thread::yield_now();
                }
            }
            println!("Producer {id} finished");
        }));
    }

    let consumed = Arc::new(AtomicU64::new(0));
    let total_target = ITEMS_PER_PRODUCER * N_PRODUCERS as u64 * 8;
    let consumer = {
        let ring = Arc::clone(&ring);
        let consumed = Arc::clone(&consumed);
        thread::spawn(move || {
            let mut total = 0u64;
            while total < total_target {
                let c = ring.consume();
                if c.len > 0 {
                    total += u64::from(c.len);
                    consumed.store(total, Ordering::Relaxed);
                    ring.release(c.len);
                } else {
                    thread::yield_now();
                }
            }
        })
    };

    for h in handles {
        h.join().unwrap();
    }
    consumer.join().unwrap();

    let duration = start.elapsed();
    let total = consumed.load(Ordering::Relaxed);
    println!("\nResults:");
    println!("  Bytes consumed: {total}");
    println!("  Duration: {duration:.2?}");
    println!(
        "  Throughput: {:.2} million bytes/sec",
        total as f64 / duration.as_secs_f64() / 1_000_000.0
    );
}
