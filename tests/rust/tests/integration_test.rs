use anyhow::Result;
use model_cache::{ModelCache, MonitorMetricsRecord, Payload, RESERVED_ALL_DEVICES};
use serde_json::json;

fn payload(value: serde_json::Value) -> Payload {
    value.as_object().cloned().expect("payload must be an object")
}

fn deployed(model_id: &str) -> Payload {
    payload(json!({"model_id": model_id, "model_status": "DEPLOYED"}))
}

fn endpoint() -> String {
    uuid::Uuid::new_v4().to_string()
}

async fn device_records(
    cache: &ModelCache,
    endpoint_id: &str,
    device_id: &str,
) -> Result<Vec<Payload>> {
    let mut found = Vec::new();
    for raw in cache.list_status(endpoint_id).await? {
        let (id, status) = ModelCache::decode_status(&raw)?;
        if id == device_id {
            found.push(status);
        }
    }
    Ok(found)
}

#[tokio::test]
async fn test_upsert_keeps_one_record_per_device() -> Result<()> {
    let cache = ModelCache::memory();
    let ep = endpoint();

    let states = ["INITIALIZING", "DEPLOYING", "DEPLOYED", "FAILED", "DEPLOYED"];
    for (i, state) in states.iter().enumerate() {
        for device in ["d1", "d2", "d3"] {
            let status = payload(json!({"model_id": "m1", "model_status": state, "round": i}));
            cache.upsert_status(&ep, device, status).await?;
        }
    }

    assert_eq!(cache.list_status_count(&ep).await?, 3);
    for device in ["d1", "d2", "d3"] {
        let records = device_records(&cache, &ep, device).await?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["round"], 4);
        assert_eq!(records[0]["model_status"], "DEPLOYED");
    }
    Ok(())
}

#[tokio::test]
async fn test_upsert_leaves_other_devices_and_endpoints_alone() -> Result<()> {
    let cache = ModelCache::memory();
    let (ep1, ep2) = (endpoint(), endpoint());

    cache.upsert_status(&ep1, "d1", deployed("m1")).await?;
    cache.upsert_status(&ep1, "d2", deployed("m2")).await?;
    cache.upsert_status(&ep2, "d1", deployed("m3")).await?;
    let before_ep2 = cache.list_status(&ep2).await?;

    cache
        .upsert_status(&ep1, "d1", payload(json!({"model_id": "m1", "model_status": "FAILED"})))
        .await?;

    let d2 = device_records(&cache, &ep1, "d2").await?;
    assert_eq!(d2, vec![deployed("m2")]);
    assert_eq!(cache.list_status(&ep2).await?, before_ep2);
    Ok(())
}

#[tokio::test]
async fn test_result_list_upsert_is_independent() -> Result<()> {
    let cache = ModelCache::memory();
    let ep = endpoint();

    cache.upsert_result(&ep, "d1", payload(json!({"model_id": "m1", "url": "a"}))).await?;
    cache.upsert_result(&ep, "d2", payload(json!({"model_id": "m1", "url": "b"}))).await?;
    cache.upsert_result(&ep, "d1", payload(json!({"model_id": "m1", "url": "c"}))).await?;

    assert_eq!(cache.list_result_count(&ep).await?, 2);
    assert_eq!(cache.list_status_count(&ep).await?, 0);

    let decoded: Vec<_> = cache
        .list_result(&ep)
        .await?
        .iter()
        .map(|raw| ModelCache::decode_result(raw))
        .collect::<model_cache::Result<_>>()?;
    assert_eq!(decoded[0].0, "d2");
    assert_eq!(decoded[1].0, "d1");
    assert_eq!(decoded[1].1["url"], "c");
    Ok(())
}

#[tokio::test]
async fn test_activation_gates_selection() -> Result<()> {
    let cache = ModelCache::memory();
    let ep = endpoint();
    cache.upsert_status(&ep, "d1", deployed("m1")).await?;
    cache.upsert_result(&ep, "d1", payload(json!({"model_id": "m1", "payload": "addr1"}))).await?;

    assert!(!cache.is_endpoint_active(&ep).await?);
    assert!(cache.select_idle_device(&ep, "m1").await?.is_none());

    cache.set_endpoint_active(&ep, true).await?;
    assert!(cache.select_idle_device(&ep, "m1").await?.is_some());

    cache.set_endpoint_active(&ep, false).await?;
    assert!(cache.select_idle_device(&ep, "m1").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_no_deployed_candidate() -> Result<()> {
    let cache = ModelCache::memory();
    let ep = endpoint();
    cache.set_endpoint_active(&ep, true).await?;

    assert!(cache.select_idle_device(&ep, "m1").await?.is_none());

    cache
        .upsert_status(&ep, "d1", payload(json!({"model_id": "m1", "model_status": "DEPLOYING"})))
        .await?;
    cache.upsert_status(&ep, "d2", deployed("m2")).await?;
    cache.upsert_result(&ep, "d1", payload(json!({"model_id": "m1", "payload": "addr1"}))).await?;
    cache.upsert_result(&ep, "d2", payload(json!({"model_id": "m2", "payload": "addr2"}))).await?;

    assert!(cache.select_idle_device(&ep, "m1").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_deployed_device_without_result_never_serves() -> Result<()> {
    let cache = ModelCache::memory();
    let ep = endpoint();
    cache.set_endpoint_active(&ep, true).await?;
    cache.upsert_status(&ep, "d1", deployed("m1")).await?;
    cache.upsert_result(&ep, "d1", payload(json!({"model_id": "m0", "payload": "old"}))).await?;

    for _ in 0..50 {
        assert!(cache.select_idle_device(&ep, "m1").await?.is_none());
    }
    Ok(())
}

#[tokio::test]
async fn test_chosen_device_without_result_is_not_replaced() -> Result<()> {
    let cache = ModelCache::memory();
    let ep = endpoint();
    cache.set_endpoint_active(&ep, true).await?;
    cache.upsert_status(&ep, "d1", deployed("m1")).await?;
    cache.upsert_status(&ep, "d2", deployed("m1")).await?;
    cache.upsert_result(&ep, "d2", payload(json!({"model_id": "m1", "payload": "addr2"}))).await?;

    let mut served = 0;
    let mut missed = 0;
    for _ in 0..200 {
        match cache.select_idle_device(&ep, "m1").await? {
            Some(result) => {
                assert_eq!(result["payload"], "addr2");
                served += 1;
            }
            None => missed += 1,
        }
    }
    assert!(served > 0);
    assert!(missed > 0, "choosing d1 must fail instead of falling back to d2");
    Ok(())
}

#[tokio::test]
async fn test_happy_path() -> Result<()> {
    let cache = ModelCache::memory();
    cache.set_endpoint_active("ep1", true).await?;
    cache.upsert_status("ep1", "d1", deployed("m1")).await?;
    cache
        .upsert_result("ep1", "d1", payload(json!({"model_id": "m1", "payload": "addr1"})))
        .await?;

    let result = cache.select_idle_device("ep1", "m1").await?.expect("d1 should serve");
    assert_eq!(result["payload"], "addr1");

    let statuses = cache.list_status("ep1").await?;
    let ids: Vec<_> = statuses
        .iter()
        .map(|raw| ModelCache::decode_status(raw).map(|(id, _)| id))
        .collect::<model_cache::Result<_>>()?;
    assert_eq!(ids, vec![RESERVED_ALL_DEVICES.to_string(), "d1".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_metrics_append_and_read() -> Result<()> {
    let cache = ModelCache::memory();
    let records = [
        MonitorMetricsRecord::new(10.0, 10.0, 1.0, 1.0, 1.0, 1.0),
        MonitorMetricsRecord::new(30.0, 15.0, 2.0, 2.0, 1.5, 2.0),
        MonitorMetricsRecord::new(45.0, 15.0, 3.0, 1.0, 1.5, 3.0),
    ];
    for record in &records {
        cache.append_metrics("ep2", record).await?;
    }

    let latest = cache.latest_metrics("ep2").await?.expect("metrics exist");
    assert_eq!(ModelCache::decode_metrics(&latest)?, records[2]);

    let mut index = 0;
    for (i, expected) in records.iter().enumerate() {
        let (item, next) = cache.metrics_at("ep2", index).await?;
        assert_eq!(ModelCache::decode_metrics(&item.expect("in range"))?, *expected);
        assert_eq!(next, i as i64 + 1);
        index = next;
    }

    assert_eq!(cache.metrics_at("unknown-endpoint", 0).await?, (None, 0));
    assert_eq!(cache.latest_metrics("unknown-endpoint").await?, None);

    let mut cursor = cache.metrics_cursor("ep2");
    let mut seen = Vec::new();
    while let Some(record) = cursor.next().await? {
        seen.push(record);
    }
    assert_eq!(seen, records.to_vec());
    Ok(())
}
