// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use devicedata_core::fields::{EXTENDED_DELIVERY, INITIAL_DELIVERY, UNMATCHED, VALUE};
use devicedata_core::{Record, StreamItem};
use devicedata_stream::bolus::DualBolusDetector;
use devicedata_stream::prelude::*;
use devicedata_test_utils::records::{basal, dual_normal, dual_square, normal_bolus, record};
use devicedata_test_utils::{
    assert_no_element_emitted, assert_stream_ended, collect_values, test_channel, unwrap_stream,
    unwrap_value,
};
use futures::{stream, StreamExt};
use serde_json::json;

#[tokio::test]
async fn test_self_join_passes_through_unrelated_records() -> anyhow::Result<()> {
    // Arrange
    let (tx, stream) = test_channel::<Record>();
    let mut result = stream.self_join(DualBolusDetector);

    // Act & Assert
    tx.unbounded_send(basal(1))?;
    assert_eq!(
        unwrap_value(Some(unwrap_stream(&mut result, 500).await)),
        basal(1)
    );

    tx.unbounded_send(normal_bolus(2, 4.0))?;
    assert_eq!(
        unwrap_value(Some(unwrap_stream(&mut result, 500).await)),
        normal_bolus(2, 4.0)
    );

    drop(tx);
    assert_stream_ended(&mut result, 500).await;

    Ok(())
}

#[tokio::test]
async fn test_self_join_holds_records_while_join_pending() -> anyhow::Result<()> {
    // Arrange
    let (tx, stream) = test_channel::<Record>();
    let mut result = stream.self_join(DualBolusDetector);

    // Act & Assert
    tx.unbounded_send(basal(1))?;
    assert_eq!(
        unwrap_value(Some(unwrap_stream(&mut result, 500).await)),
        basal(1)
    );

    tx.unbounded_send(dual_normal("k1", "d1", 2.0))?;
    assert_no_element_emitted(&mut result, 100).await;

    tx.unbounded_send(basal(2))?;
    assert_no_element_emitted(&mut result, 100).await;

    tx.unbounded_send(dual_square("k1", "d1", 1.0))?;
    let joined = unwrap_value(Some(unwrap_stream(&mut result, 500).await));
    assert_eq!(joined.get_f64(VALUE), Some(3.0));
    assert_eq!(joined.get_f64(INITIAL_DELIVERY), Some(2.0));
    assert_eq!(joined.get_f64(EXTENDED_DELIVERY), Some(1.0));
    assert_eq!(joined.get_str("id"), Some("k1-normal"));
    assert_eq!(joined.get_f64("duration"), Some(3_600_000.0));
    assert_eq!(
        unwrap_value(Some(unwrap_stream(&mut result, 500).await)),
        basal(2)
    );

    drop(tx);
    assert_stream_ended(&mut result, 500).await;

    Ok(())
}

#[tokio::test]
async fn test_self_join_flushes_unmatched_half_at_end() -> anyhow::Result<()> {
    // Arrange
    let (tx, stream) = test_channel::<Record>();
    let mut result = stream.self_join(DualBolusDetector);

    // Act
    tx.unbounded_send(dual_normal("k1", "d1", 2.0))?;
    tx.unbounded_send(basal(1))?;
    tx.unbounded_send(basal(2))?;
    assert_no_element_emitted(&mut result, 100).await;
    drop(tx);

    // Assert
    let half = unwrap_value(Some(unwrap_stream(&mut result, 500).await));
    assert_eq!(half.get(UNMATCHED), Some(&json!(true)));
    assert_eq!(half.sub_type(), Some("dual/normal"));
    assert!(!half.contains(EXTENDED_DELIVERY));
    assert_eq!(
        unwrap_value(Some(unwrap_stream(&mut result, 500).await)),
        basal(1)
    );
    assert_eq!(
        unwrap_value(Some(unwrap_stream(&mut result, 500).await)),
        basal(2)
    );
    assert_stream_ended(&mut result, 500).await;

    Ok(())
}

#[tokio::test]
async fn test_self_join_buffers_other_device_halves() -> anyhow::Result<()> {
    // Arrange
    let (tx, stream) = test_channel::<Record>();
    let mut result = stream.self_join(DualBolusDetector);

    // Act
    tx.unbounded_send(dual_normal("k1", "d1", 2.0))?;
    tx.unbounded_send(dual_square("k9", "d2", 5.0))?;
    assert_no_element_emitted(&mut result, 100).await;
    tx.unbounded_send(dual_square("k1", "d1", 1.0))?;

    // Assert
    let joined = unwrap_value(Some(unwrap_stream(&mut result, 500).await));
    assert_eq!(joined.get_f64(VALUE), Some(3.0));
    assert_eq!(
        unwrap_value(Some(unwrap_stream(&mut result, 500).await)),
        dual_square("k9", "d2", 5.0)
    );

    Ok(())
}

#[tokio::test]
async fn test_self_join_handles_consecutive_joins() -> anyhow::Result<()> {
    // Arrange
    let input = vec![
        dual_normal("k1", "d1", 2.0),
        dual_square("k1", "d1", 1.0),
        basal(1),
        dual_normal("k2", "d1", 4.0),
        basal(2),
        dual_square("k2", "d1", 0.5),
    ];
    let source = stream::iter(input).map(StreamItem::Value);

    // Act
    let output = collect_values(source.self_join(DualBolusDetector)).await;

    // Assert
    assert_eq!(output.len(), 4);
    assert_eq!(output[0].get_f64(VALUE), Some(3.0));
    assert_eq!(output[1], basal(1));
    assert_eq!(output[2].get_f64(VALUE), Some(4.5));
    assert_eq!(output[3], basal(2));

    Ok(())
}

#[tokio::test]
async fn test_self_join_leaves_orphan_square_untouched() -> anyhow::Result<()> {
    // Arrange
    let (tx, stream) = test_channel::<Record>();
    let mut result = stream.self_join(DualBolusDetector);

    // Act & Assert
    tx.unbounded_send(dual_square("k1", "d1", 1.0))?;
    assert_eq!(
        unwrap_value(Some(unwrap_stream(&mut result, 500).await)),
        dual_square("k1", "d1", 1.0)
    );

    Ok(())
}

#[tokio::test]
async fn test_self_join_does_not_reopen_flushed_halves() -> anyhow::Result<()> {
    // Arrange
    let first_pass = collect_values(
        stream::iter(vec![basal(1), dual_normal("k1", "d1", 2.0), basal(2)])
            .map(StreamItem::Value)
            .self_join(DualBolusDetector),
    )
    .await;

    // Act
    let (tx, stream) = test_channel::<Record>();
    let mut result = stream.self_join(DualBolusDetector);
    for item in first_pass.clone() {
        tx.unbounded_send(item)?;
    }

    // Assert
    for expected in first_pass {
        assert_eq!(
            unwrap_value(Some(unwrap_stream(&mut result, 500).await)),
            expected
        );
    }
    drop(tx);
    assert_stream_ended(&mut result, 500).await;

    Ok(())
}

#[tokio::test]
async fn test_self_join_later_half_replaces_pending_one() -> anyhow::Result<()> {
    // Arrange
    let (tx, stream) = test_channel::<Record>();
    let mut result = stream.self_join(DualBolusDetector);

    // Act
    tx.unbounded_send(dual_normal("k0", "d1", 9.0))?;
    tx.unbounded_send(dual_normal("k1", "d1", 2.0))?;
    tx.unbounded_send(dual_square("k1", "d1", 1.0))?;

    // Assert
    let joined = unwrap_value(Some(unwrap_stream(&mut result, 500).await));
    assert_eq!(joined.get_f64(VALUE), Some(3.0));
    assert_eq!(joined.get_str("joinKey"), Some("k1"));
    drop(tx);
    assert_stream_ended(&mut result, 500).await;

    Ok(())
}

#[tokio::test]
async fn test_self_join_treats_missing_sub_type_as_pass_through() -> anyhow::Result<()> {
    // Arrange
    let (tx, stream) = test_channel::<Record>();
    let mut result = stream.self_join(DualBolusDetector);
    let untyped = record(json!({"type": "bolus", "joinKey": "k1", "deviceId": "d1"}));

    // Act & Assert
    tx.unbounded_send(untyped.clone())?;
    assert_eq!(
        unwrap_value(Some(unwrap_stream(&mut result, 500).await)),
        untyped
    );

    Ok(())
}
