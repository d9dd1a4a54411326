use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use plotter_link::network::{Available, Close, Connect, Connection, Read, Write};
use plotter_link::publisher::{IotPlotter, Options, Publisher, SharedEpoch, payload};
use plotter_link::time::Timer;
use std::hint::black_box;

const RESPONSE: &[u8] = b"HTTP/1.1 201 Created\r\n";

/// Swallows the request and answers immediately.
struct NullConnection {
    written: usize,
    response: &'static [u8],
}

impl Read for NullConnection {
    type Error = ();
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let len = buf.len().min(self.response.len());
        buf[..len].copy_from_slice(&self.response[..len]);
        self.response = &self.response[len..];
        Ok(len)
    }
}

impl Write for NullConnection {
    type Error = ();
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.written += buf.len();
        Ok(buf.len())
    }
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Close for NullConnection {
    type Error = ();
    fn close(self) -> Result<(), Self::Error> {
        black_box(self.written);
        Ok(())
    }
}

impl Available for NullConnection {
    fn available(&mut self) -> usize {
        self.response.len()
    }
}

impl Connection for NullConnection {}

struct NullNetwork;

impl Connect for NullNetwork {
    type Connection = NullConnection;
    type Error = ();
    fn connect(&mut self, _remote: &str) -> Result<Self::Connection, Self::Error> {
        Ok(NullConnection {
            written: 0,
            response: RESPONSE,
        })
    }
}

struct NoWait;

impl Timer for NoWait {
    fn now_ms(&mut self) -> u64 {
        0
    }
    fn delay_ms(&mut self, _ms: u32) {}
}

fn readings() -> Vec<(String, String)> {
    (0..16)
        .map(|i| (format!("Sensor{i}"), format!("{}.{}", 20 + i, i)))
        .collect()
}

fn bench_compute_size(c: &mut Criterion) {
    let owned = readings();
    let pairs: Vec<(&str, &str)> = owned.iter().map(|(n, v)| (n.as_str(), v.as_str())).collect();
    let cycle = SharedEpoch::new(&pairs, 1_690_000_000);

    c.bench_function("compute_size_16_records", |b| {
        b.iter(|| payload::compute_size(black_box(&cycle)))
    });
}

fn bench_publish(c: &mut Criterion) {
    let owned = readings();
    let pairs: Vec<(&str, &str)> = owned.iter().map(|(n, v)| (n.as_str(), v.as_str())).collect();
    let cycle = SharedEpoch::new(&pairs, 1_690_000_000);

    let mut group = c.benchmark_group("publish_16_records");
    group.throughput(Throughput::Bytes(payload::compute_size(&cycle) as u64));

    let mut small: IotPlotter<'_, 96> = IotPlotter::with_identity(Options::default(), "key", "1");
    group.bench_function("buffer_96", |b| {
        b.iter(|| small.publish(&mut NullNetwork, black_box(&cycle), &mut NoWait))
    });

    let mut large: IotPlotter = IotPlotter::with_identity(Options::default(), "key", "1");
    group.bench_function("buffer_750", |b| {
        b.iter(|| large.publish(&mut NullNetwork, black_box(&cycle), &mut NoWait))
    });
    group.finish();
}

criterion_group!(benches, bench_compute_size, bench_publish);
criterion_main!(benches);
