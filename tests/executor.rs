use futures::future::join_all;
use kvgate::commands::{InsertPosition, SortOptions};
use kvgate::connection::Connector;
use kvgate::executor::{KeyType, Ttl};
use kvgate::{Config, Db, Error, Executor, OrSentinel, Pool};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::time::{self, Duration};

fn executor() -> Executor {
    Executor::connect(&Config::memory(4)).unwrap()
}

fn db(index: u8) -> Db {
    Db::new(index).unwrap()
}

#[tokio::test]
async fn set_then_get() {
    let executor = executor();

    executor.set("greeting", "hello").await.unwrap();

    assert_eq!(executor.get("greeting").await.unwrap(), Some("hello".to_string()));
    assert_eq!(executor.get("missing").await.unwrap(), None);
    assert!(executor.exists("greeting").await.unwrap());
}

#[tokio::test]
async fn ttl_states() {
    let executor = executor();

    assert_eq!(executor.ttl("key").await.unwrap(), Ttl::Missing);

    executor.set("key", "value").await.unwrap();
    assert_eq!(executor.ttl("key").await.unwrap(), Ttl::Persistent);

    assert!(executor.expire("key", 100).await.unwrap());
    match executor.ttl("key").await.unwrap() {
        Ttl::Expires(left) => assert!(left > Duration::ZERO && left <= Duration::from_secs(100)),
        ttl => panic!("unexpected ttl {ttl:?}"),
    }

    assert!(executor.persist("key").await.unwrap());
    assert_eq!(executor.ttl("key").await.unwrap(), Ttl::Persistent);

    assert!(!executor.expire("missing", 100).await.unwrap());
}

#[tokio::test]
async fn demo_scenario() {
    time::pause();

    let executor = executor().with_db(db(1));

    executor.set("20182018", "test-data").await.unwrap();
    assert!(executor.expire("20182018", 60).await.unwrap());
    assert_eq!(
        executor.get("20182018").await.unwrap(),
        Some("test-data".to_string())
    );

    time::advance(Duration::from_secs(61)).await;
    assert_eq!(executor.get("20182018").await.unwrap(), None);

    executor.set("20182018", "test-data").await.unwrap();
    assert!(executor.expire("20182018", 0).await.unwrap());
    assert_eq!(executor.get("20182018").await.unwrap(), None);
}

#[tokio::test]
async fn negative_deltas_never_reach_the_store() {
    // Nothing listens on this port, so any command that got as far as the pool would fail
    // with a connection error instead.
    let connector = Connector::redis("redis://127.0.0.1:1/").unwrap();
    let pool = Pool::new(connector, 1, Some(Duration::from_millis(100))).unwrap();
    let executor = Executor::new(pool);

    let err = executor.incr_by("counter", -1).await.unwrap_err();
    assert!(matches!(err, Error::Argument(_)));

    let err = executor.decr_by("counter", -1).await.unwrap_err();
    assert!(matches!(err, Error::Argument(_)));

    let err = executor.hincr_by("hash", "field", -5).await.unwrap_err();
    assert!(matches!(err, Error::Argument(_)));

    let err = executor.hdecr_by("hash", "field", -5).await.unwrap_err();
    assert!(matches!(err, Error::Argument(_)));

    let err = executor.get("counter").await.unwrap_err();
    assert!(matches!(err, Error::Connection(_)));
}

#[tokio::test]
async fn empty_argument_lists_are_rejected() {
    let executor = executor();
    let none: [&str; 0] = [];

    assert!(matches!(executor.del(&none).await, Err(Error::Argument(_))));
    assert!(matches!(executor.mget(&none).await, Err(Error::Argument(_))));
    assert!(matches!(executor.sadd("set", &none).await, Err(Error::Argument(_))));
    assert!(matches!(executor.sinter(&none).await, Err(Error::Argument(_))));
    assert!(matches!(executor.zrem("zset", &none).await, Err(Error::Argument(_))));
}

#[tokio::test]
async fn increments() {
    let executor = executor();

    assert_eq!(executor.incr("counter").await.unwrap(), 1);
    assert_eq!(executor.incr_by("counter", 10).await.unwrap(), 11);
    assert_eq!(executor.decr_by("counter", 4).await.unwrap(), 7);
    assert_eq!(executor.decr("counter").await.unwrap(), 6);

    assert_eq!(executor.hincr_by("hash", "field", 3).await.unwrap(), 3);
    assert_eq!(executor.hdecr_by("hash", "field", 5).await.unwrap(), -2);

    let value = executor.hincr_by_float("hash", "price", 1.5).await.unwrap();
    assert!((value - 1.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn strings() {
    let executor = executor();

    assert!(executor.set_nx("key", "a").await.unwrap());
    assert!(!executor.set_nx("key", "b").await.unwrap());
    assert_eq!(executor.get_set("key", "c").await.unwrap(), Some("a".to_string()));
    assert_eq!(executor.append("key", "def").await.unwrap(), 4);
    assert_eq!(executor.strlen("key").await.unwrap(), 4);
    assert_eq!(executor.get_range("key", 1, -1).await.unwrap(), "def");
    assert_eq!(executor.set_range("key", 6, "gh").await.unwrap(), 8);
    assert_eq!(
        executor.get_bytes("key").await.unwrap(),
        Some(b"cdef\0\0gh".to_vec())
    );

    executor.mset(&[("k1", "v1"), ("k2", "v2")]).await.unwrap();
    assert!(!executor.mset_nx(&[("k2", "x"), ("k3", "x")]).await.unwrap());
    assert_eq!(
        executor.mget(&["k1", "k3"]).await.unwrap(),
        vec![Some("v1".to_string()), None]
    );

    executor.set_ex("temp", 30, "value").await.unwrap();
    assert!(matches!(executor.ttl("temp").await.unwrap(), Ttl::Expires(_)));
    assert!(matches!(
        executor.set_ex("temp", 0, "value").await,
        Err(Error::Argument(_))
    ));
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Session {
    user: String,
    roles: Vec<String>,
    expires_in: Option<u64>,
}

#[tokio::test]
async fn objects() {
    let executor = executor();
    let session = Session {
        user: "ada".to_string(),
        roles: vec!["admin".to_string()],
        expires_in: Some(3600),
    };

    executor.set_object("session", &session).await.unwrap();

    let stored: Option<Session> = executor.get_object("session").await.unwrap();
    assert_eq!(stored, Some(session));

    let missing: Option<Session> = executor.get_object("missing").await.unwrap();
    assert_eq!(missing, None);

    executor.set("garbage", "x").await.unwrap();
    let res: Result<Option<Session>, _> = executor.get_object("garbage").await;
    assert!(matches!(res, Err(Error::Serialization(_))));
}

#[tokio::test]
async fn hashes() {
    let executor = executor();

    assert!(executor.hset("user", "name", "ada").await.unwrap());
    assert!(!executor.hset_nx("user", "name", "bob").await.unwrap());
    executor
        .hmset("user", &[("lang", "en"), ("city", "london")])
        .await
        .unwrap();

    assert_eq!(executor.hget("user", "name").await.unwrap(), Some("ada".to_string()));
    assert_eq!(
        executor.hmget("user", &["lang", "zip"]).await.unwrap(),
        vec![Some("en".to_string()), None]
    );
    assert!(executor.hexists("user", "city").await.unwrap());
    assert_eq!(executor.hlen("user").await.unwrap(), 3);
    assert_eq!(executor.hkeys("user").await.unwrap(), vec!["city", "lang", "name"]);
    assert_eq!(executor.hvals("user").await.unwrap(), vec!["london", "en", "ada"]);

    let all = executor.hgetall("user").await.unwrap();
    assert_eq!(all.get("name"), Some(&"ada".to_string()));
    assert_eq!(all.len(), 3);

    assert_eq!(executor.hdel("user", &["name", "zip"]).await.unwrap(), 1);
    assert_eq!(executor.key_type("user").await.unwrap(), KeyType::Hash);
}

#[tokio::test]
async fn lists() {
    let executor = executor();

    assert_eq!(executor.rpush("list", &["b", "c"]).await.unwrap(), 2);
    assert_eq!(executor.lpush("list", &["a"]).await.unwrap(), 3);
    assert_eq!(
        executor
            .linsert("list", InsertPosition::After, "c", "d")
            .await
            .unwrap(),
        4
    );
    executor.lset("list", 0, "z").await.unwrap();
    assert_eq!(executor.lindex("list", -1).await.unwrap(), Some("d".to_string()));
    assert_eq!(executor.lrange("list", 0, -1).await.unwrap(), vec!["z", "b", "c", "d"]);

    executor.ltrim("list", 1, -1).await.unwrap();
    assert_eq!(executor.llen("list").await.unwrap(), 3);
    assert_eq!(executor.lrem("list", 0, "c").await.unwrap(), 1);

    assert_eq!(
        executor.rpoplpush("list", "other").await.unwrap(),
        Some("d".to_string())
    );
    assert_eq!(executor.lpop("list").await.unwrap(), Some("b".to_string()));
    assert_eq!(executor.rpop("list").await.unwrap(), None);
    assert_eq!(executor.key_type("list").await.unwrap(), KeyType::None);
}

#[tokio::test]
async fn sets() {
    let executor = executor();

    assert_eq!(executor.sadd("a", &["1", "2", "3"]).await.unwrap(), 3);
    assert_eq!(executor.sadd("b", &["3", "4"]).await.unwrap(), 2);

    let set = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<HashSet<_>>();

    assert_eq!(executor.sdiff(&["a", "b"]).await.unwrap(), set(&["1", "2"]));
    assert_eq!(executor.sinter(&["a", "b"]).await.unwrap(), set(&["3"]));
    assert_eq!(executor.sunion(&["a", "b"]).await.unwrap(), set(&["1", "2", "3", "4"]));

    assert_eq!(executor.sdiff_store("d", &["a", "b"]).await.unwrap(), 2);
    assert_eq!(executor.sinter_store("i", &["a", "b"]).await.unwrap(), 1);
    assert_eq!(executor.sunion_store("u", &["a", "b"]).await.unwrap(), 4);
    assert_eq!(executor.smembers("d").await.unwrap(), set(&["1", "2"]));

    assert!(executor.smove("a", "b", "1").await.unwrap());
    assert!(executor.sismember("b", "1").await.unwrap());
    assert_eq!(executor.scard("a").await.unwrap(), 2);
    assert_eq!(executor.srem("a", &["2"]).await.unwrap(), 1);

    assert_eq!(executor.srandmember("a").await.unwrap(), Some("3".to_string()));
    assert_eq!(executor.spop("a").await.unwrap(), Some("3".to_string()));
    assert_eq!(executor.spop("a").await.unwrap(), None);
}

#[tokio::test]
async fn sorted_sets() {
    let executor = executor();

    assert!(executor.zadd("board", 10.0, "ada").await.unwrap());
    assert!(executor.zadd("board", 20.0, "bob").await.unwrap());
    assert!(executor.zadd("board", 15.0, "cy").await.unwrap());
    assert!(!executor.zadd("board", 5.0, "ada").await.unwrap());

    assert_eq!(executor.zrange("board", 0, -1).await.unwrap(), vec!["ada", "cy", "bob"]);
    assert_eq!(executor.zrevrange("board", 0, 0).await.unwrap(), vec!["bob"]);
    assert_eq!(
        executor.zrange_by_score("board", 10.0, 20.0).await.unwrap(),
        vec!["cy", "bob"]
    );
    assert_eq!(executor.zcount("board", 0.0, 15.0).await.unwrap(), 2);
    assert_eq!(executor.zcard("board").await.unwrap(), 3);

    assert_eq!(executor.zincr_by("board", 2.5, "ada").await.unwrap(), 7.5);
    assert_eq!(executor.zscore("board", "ada").await.unwrap(), Some(7.5));
    assert_eq!(executor.zrank("board", "bob").await.unwrap(), Some(2));
    assert_eq!(executor.zrevrank("board", "bob").await.unwrap(), Some(0));
    assert_eq!(executor.zrank("board", "nobody").await.unwrap(), None);

    assert_eq!(executor.zrem_range_by_rank("board", 0, 0).await.unwrap(), 1);
    assert_eq!(executor.zrem_range_by_score("board", 15.0, 15.0).await.unwrap(), 1);
    assert_eq!(executor.zrem("board", &["bob"]).await.unwrap(), 1);
    assert_eq!(executor.key_type("board").await.unwrap(), KeyType::None);

    assert!(matches!(
        executor.zadd("board", f64::NAN, "ada").await,
        Err(Error::Argument(_))
    ));
}

#[tokio::test]
async fn keys_and_flush() {
    let executor = executor();
    let other = executor.with_db(db(7));

    executor.set("user:1", "a").await.unwrap();
    executor.set("user:2", "b").await.unwrap();
    executor.set("order:1", "c").await.unwrap();
    other.set("user:3", "d").await.unwrap();

    assert_eq!(executor.keys("user:*").await.unwrap(), vec!["user:1", "user:2"]);
    assert_eq!(executor.del(&["user:1", "missing"]).await.unwrap(), 1);
    assert_eq!(executor.key_type("order:1").await.unwrap(), KeyType::String);

    executor.flush_db().await.unwrap();
    assert!(executor.keys("*").await.unwrap().is_empty());
    assert_eq!(other.keys("*").await.unwrap(), vec!["user:3"]);

    executor.flush_all().await.unwrap();
    assert!(other.keys("*").await.unwrap().is_empty());
}

#[tokio::test]
async fn databases_are_isolated() {
    let executor = executor();
    let first = executor.with_db(db(1));
    let second = executor.with_db(db(2));

    first.set("key", "one").await.unwrap();
    second.set("key", "two").await.unwrap();

    assert_eq!(first.get("key").await.unwrap(), Some("one".to_string()));
    assert_eq!(second.get("key").await.unwrap(), Some("two".to_string()));
    assert_eq!(executor.get("key").await.unwrap(), None);
}

#[tokio::test]
async fn unrepresentable_timeouts_are_rejected() {
    let executor = executor();
    executor.set("key", "value").await.unwrap();

    let err = executor.expire("key", i64::MAX).await.unwrap_err();
    assert!(matches!(err, Error::Command(_)));
    let err = executor.set_ex("key", u64::MAX, "other").await.unwrap_err();
    assert!(matches!(err, Error::Command(_)));
    let err = executor.set_range("key", u64::MAX, "v").await.unwrap_err();
    assert!(matches!(err, Error::Command(_)));

    assert_eq!(executor.get("key").await.unwrap(), Some("value".to_string()));
    assert_eq!(executor.ttl("key").await.unwrap(), Ttl::Persistent);
}

#[tokio::test]
async fn sort() {
    let executor = executor();

    executor.rpush("numbers", &["3", "10", "1", "2"]).await.unwrap();
    executor.sadd("names", &["bob", "alice", "carol"]).await.unwrap();

    assert_eq!(executor.sort("numbers").await.unwrap(), vec!["1", "2", "3", "10"]);
    let options = SortOptions {
        descending: true,
        limit: Some((0, 2)),
        ..SortOptions::default()
    };
    assert_eq!(executor.sort_by("numbers", options).await.unwrap(), vec!["10", "3"]);

    let alpha = SortOptions {
        alpha: true,
        ..SortOptions::default()
    };
    assert_eq!(
        executor.sort_by("names", alpha).await.unwrap(),
        vec!["alice", "bob", "carol"]
    );
    assert!(matches!(executor.sort("names").await, Err(Error::Command(_))));
    assert!(executor.sort("missing").await.unwrap().is_empty());
}

#[tokio::test]
async fn writes_with_a_timeout() {
    time::pause();

    let executor = executor();

    assert!(executor.hset_ex("hash", "field", "1", 30).await.unwrap());
    executor.hmset_ex("hash2", &[("a", "1"), ("b", "2")], 30).await.unwrap();
    assert_eq!(executor.sadd_ex("set", &["a", "b"], 30).await.unwrap(), 2);
    assert_eq!(executor.rpush_ex("list", &["a"], 30).await.unwrap(), 1);
    assert_eq!(executor.rpush_ex("persistent", &["a"], 0).await.unwrap(), 1);

    for key in ["hash", "hash2", "set", "list"] {
        assert!(matches!(executor.ttl(key).await.unwrap(), Ttl::Expires(_)), "{key}");
    }
    assert_eq!(executor.ttl("persistent").await.unwrap(), Ttl::Persistent);

    time::advance(Duration::from_secs(31)).await;

    for key in ["hash", "hash2", "set", "list"] {
        assert!(!executor.exists(key).await.unwrap(), "{key}");
    }
    assert!(executor.exists("persistent").await.unwrap());
}

#[tokio::test]
async fn wrong_type_is_a_command_error() {
    let executor = executor();
    executor.set("key", "value").await.unwrap();

    let err = executor.lpush("key", &["x"]).await.unwrap_err();
    assert!(matches!(err, Error::Command(_)));

    let err = executor.hget("key", "field").await.unwrap_err();
    assert!(matches!(err, Error::Command(_)));

    // The failed commands handed their connections back.
    let status = executor.pool().status();
    assert_eq!(status.available, status.size);
    assert_eq!(executor.get("key").await.unwrap(), Some("value".to_string()));
}

#[tokio::test]
async fn failures_collapse_to_sentinels_on_request() {
    let executor = executor();
    executor.set("key", "value").await.unwrap();

    assert_eq!(executor.llen("key").await.or_sentinel(), 0);
    assert!(executor.smembers("key").await.or_sentinel().is_empty());
    assert!(!executor.sismember("key", "x").await.or_sentinel());
    assert_eq!(executor.hgetall("key").await.or_sentinel(), HashMap::new());
    assert_eq!(executor.lpop("key").await.or_sentinel(), None);
}

#[tokio::test]
async fn exhausted_pool() {
    let pool = Pool::new(Connector::memory(), 1, Some(Duration::from_millis(50))).unwrap();
    let executor = Executor::new(pool);

    let lease = executor.pool().lease().await.unwrap();
    let err = executor.get("key").await.unwrap_err();
    assert!(matches!(err, Error::PoolExhausted));

    drop(lease);
    assert_eq!(executor.get("key").await.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_leases_never_exceed_pool_size() {
    let pool = Pool::new(Connector::memory(), 2, None).unwrap();
    let executor = Executor::new(pool);
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let tasks = (0..8).map(|i| {
        let executor = executor.clone();
        let in_flight = in_flight.clone();
        let peak = peak.clone();

        tokio::spawn(async move {
            let lease = executor.pool().lease().await.unwrap();
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);

            time::sleep(Duration::from_millis(20)).await;

            in_flight.fetch_sub(1, Ordering::SeqCst);
            drop(lease);

            executor.set(format!("key:{i}"), "value").await.unwrap();
        })
    });

    for res in join_all(tasks).await {
        res.unwrap();
    }

    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(executor.keys("key:*").await.unwrap().len(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_pops_take_distinct_items() {
    let executor = executor();
    let items: Vec<String> = (0..50).map(|i| format!("item:{i}")).collect();
    executor.rpush("queue", &items).await.unwrap();

    let tasks = (0..50).map(|i| {
        let executor = executor.clone();
        tokio::spawn(async move {
            if i % 2 == 0 {
                executor.lpop("queue").await
            } else {
                executor.rpop("queue").await
            }
        })
    });

    let mut popped = HashSet::new();
    for res in join_all(tasks).await {
        let item = res.unwrap().unwrap().expect("the queue ran dry too early");
        assert!(popped.insert(item), "an item was popped twice");
    }

    assert_eq!(popped, items.into_iter().collect::<HashSet<_>>());
    assert_eq!(executor.llen("queue").await.unwrap(), 0);
}
