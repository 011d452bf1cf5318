// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Error propagation tests for `self_join` operator.

use devicedata_core::fields::VALUE;
use devicedata_core::{DeviceDataError, Record, StreamItem};
use devicedata_stream::prelude::*;
use devicedata_test_utils::records::{basal, dual_normal, dual_square};
use devicedata_test_utils::{
    assert_no_element_emitted, assert_stream_ended, test_channel, test_channel_with_errors,
    unwrap_stream, unwrap_value,
};

#[tokio::test]
async fn test_self_join_propagates_upstream_error() -> anyhow::Result<()> {
    // Arrange
    let (tx, stream) = test_channel_with_errors::<Record>();
    let mut result = stream.self_join(DualBolusDetector);

    // Act
    tx.unbounded_send(StreamItem::Error(DeviceDataError::stream_error("test error")))?;

    // Assert
    assert!(matches!(
        unwrap_stream(&mut result, 500).await,
        StreamItem::Error(DeviceDataError::StreamProcessingError { .. })
    ));

    tx.unbounded_send(StreamItem::Value(basal(1)))?;
    assert_eq!(
        unwrap_value(Some(unwrap_stream(&mut result, 500).await)),
        basal(1)
    );

    Ok(())
}

#[tokio::test]
async fn test_self_join_upstream_error_keeps_pending_join() -> anyhow::Result<()> {
    // Arrange
    let (tx, stream) = test_channel_with_errors::<Record>();
    let mut result = stream.self_join(DualBolusDetector);

    // Act & Assert
    tx.unbounded_send(StreamItem::Value(dual_normal("k1", "d1", 2.0)))?;
    assert_no_element_emitted(&mut result, 100).await;

    tx.unbounded_send(StreamItem::Error(DeviceDataError::stream_error("test error")))?;
    assert!(unwrap_stream(&mut result, 500).await.is_error());

    tx.unbounded_send(StreamItem::Value(dual_square("k1", "d1", 1.0)))?;
    let joined = unwrap_value(Some(unwrap_stream(&mut result, 500).await));
    assert_eq!(joined.get_f64(VALUE), Some(3.0));

    Ok(())
}

#[tokio::test]
async fn test_self_join_join_key_mismatch_ends_stream() -> anyhow::Result<()> {
    // Arrange
    let (tx, stream) = test_channel::<Record>();
    let mut result = stream.self_join(DualBolusDetector);

    // Act
    tx.unbounded_send(basal(1))?;
    tx.unbounded_send(dual_normal("k1", "d1", 2.0))?;
    tx.unbounded_send(basal(2))?;
    tx.unbounded_send(dual_square("k2", "d1", 1.0))?;

    // Assert
    assert_eq!(
        unwrap_value(Some(unwrap_stream(&mut result, 500).await)),
        basal(1)
    );
    assert!(matches!(
        unwrap_stream(&mut result, 500).await,
        StreamItem::Error(DeviceDataError::JoinKeyMismatch { .. })
    ));

    // Nothing from the failed session is flushed, and later input is ignored
    tx.unbounded_send(basal(3))?;
    assert_stream_ended(&mut result, 500).await;

    Ok(())
}

#[tokio::test]
async fn test_self_join_join_key_mismatch_reports_both_keys() -> anyhow::Result<()> {
    // Arrange
    let (tx, stream) = test_channel::<Record>();
    let mut result = stream.self_join(DualBolusDetector);

    // Act
    tx.unbounded_send(dual_normal("k1", "d1", 2.0))?;
    tx.unbounded_send(dual_square("k2", "d1", 1.0))?;

    // Assert
    let StreamItem::Error(error) = unwrap_stream(&mut result, 500).await else {
        panic!("expected a join key mismatch");
    };
    assert_eq!(
        error.to_string(),
        "Mismatched joinKeys[k1][k2] at ts[2014-03-06T09:00:00]"
    );
    assert!(error.is_permanent());
    assert!(!error.is_recoverable());

    Ok(())
}
