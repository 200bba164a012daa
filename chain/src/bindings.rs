//! Contract interfaces used by the operator.
//!
//! Only the functions and events the operator touches are declared.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IHookRegistry {
        function isOperator(address operator) external view returns (bool);
        function registerOperator() external payable;
    }
}

sol! {
    #[sol(rpc)]
    interface IRiskServiceManager {
        struct RiskTask {
            address hook;
            uint32 taskCreatedBlock;
            bytes32 poolId;
            uint256 checkpointId;
        }

        event NewRiskTaskCreated(uint32 indexed taskIndex, RiskTask task);

        function createNewTask(address hook, bytes32 poolId) external;

        function respondToTask(
            RiskTask calldata task,
            uint32 taskIndex,
            uint256 riskScore,
            bytes calldata signature
        ) external;
    }
}

// EigenLayer core + middleware, used by the stake-registry registration path.

sol! {
    #[sol(rpc)]
    interface IDelegationManager {
        struct OperatorDetails {
            address deprecatedEarningsReceiver;
            address delegationApprover;
            uint32 stakerOptOutWindowBlocks;
        }

        function registerAsOperator(
            OperatorDetails calldata registeringOperatorDetails,
            string calldata metadataURI
        ) external;
    }
}

sol! {
    #[sol(rpc)]
    interface IAVSDirectory {
        function calculateOperatorAVSRegistrationDigestHash(
            address operator,
            address avs,
            bytes32 salt,
            uint256 expiry
        ) external view returns (bytes32);
    }
}

sol! {
    #[sol(rpc)]
    interface IECDSAStakeRegistry {
        struct SignatureWithSaltAndExpiry {
            bytes signature;
            bytes32 salt;
            uint256 expiry;
        }

        function operatorRegistered(address operator) external view returns (bool);

        function registerOperatorWithSignature(
            SignatureWithSaltAndExpiry memory operatorSignature,
            address signingKey
        ) external;
    }
}
