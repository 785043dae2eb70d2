//! RequestDispatcher の実装
//!
//! - InlineDispatcher: submit の場でサービスを呼び、応答を順に積む（決定的。テスト・スクリプト用）
//! - ThreadedDispatcher: 要求ごとにワーカースレッドで呼び、mpsc で応答を返す（呼び出し元はブロックしない）

use crate::ports::outbound::{CatalogService, Delivery, Envelope, RequestDispatcher};
use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::Arc;

/// その場で実行する Dispatcher
pub struct InlineDispatcher {
    service: Arc<dyn CatalogService>,
    ready: VecDeque<Delivery>,
}

impl InlineDispatcher {
    pub fn new(service: Arc<dyn CatalogService>) -> Self {
        Self {
            service,
            ready: VecDeque::new(),
        }
    }
}

impl RequestDispatcher for InlineDispatcher {
    fn submit(&mut self, envelope: Envelope) {
        let reply = envelope.request.run(self.service.as_ref());
        self.ready.push_back(Delivery {
            ticket: envelope.ticket,
            reply,
        });
    }

    fn try_recv(&mut self) -> Option<Delivery> {
        self.ready.pop_front()
    }

    fn recv(&mut self) -> Option<Delivery> {
        self.ready.pop_front()
    }
}

/// ワーカースレッドで実行する Dispatcher
pub struct ThreadedDispatcher {
    service: Arc<dyn CatalogService>,
    tx: mpsc::Sender<Delivery>,
    rx: mpsc::Receiver<Delivery>,
    in_flight: usize,
}

impl ThreadedDispatcher {
    pub fn new(service: Arc<dyn CatalogService>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            service,
            tx,
            rx,
            in_flight: 0,
        }
    }
}

impl RequestDispatcher for ThreadedDispatcher {
    fn submit(&mut self, envelope: Envelope) {
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        self.in_flight += 1;
        std::thread::spawn(move || {
            let reply = envelope.request.run(service.as_ref());
            let _ = tx.send(Delivery {
                ticket: envelope.ticket,
                reply,
            });
        });
    }

    fn try_recv(&mut self) -> Option<Delivery> {
        let delivery = self.rx.try_recv().ok()?;
        self.in_flight -= 1;
        Some(delivery)
    }

    fn recv(&mut self) -> Option<Delivery> {
        // 自分も Sender を持っているので、待ち件数 0 で recv すると戻らない
        if self.in_flight == 0 {
            return None;
        }
        let delivery = self.rx.recv().ok()?;
        self.in_flight -= 1;
        Some(delivery)
    }
}
